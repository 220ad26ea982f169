//! JSON payloads exchanged with the remote store.
//!
//! Gateways that speak HTTP use these to stay byte-compatible with the
//! server: reads answer `{"places": [...]}`, the attach write sends
//! `{"placeId": "..."}`.

use crate::model::place::{Place, PlaceId};
use crate::remote::gateway::GatewayResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesResponse {
    pub places: Vec<Place>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRequest {
    #[serde(rename = "placeId")]
    pub place_id: PlaceId,
}

pub fn decode_places_response(body: &[u8]) -> GatewayResult<Vec<Place>> {
    let response: PlacesResponse = serde_json::from_slice(body)?;
    Ok(response.places)
}

pub fn encode_association_request(id: &PlaceId) -> GatewayResult<Vec<u8>> {
    let request = AssociationRequest {
        place_id: id.clone(),
    };
    Ok(serde_json::to_vec(&request)?)
}

#[cfg(test)]
mod tests {
    use super::{decode_places_response, encode_association_request};
    use crate::model::place::PlaceId;
    use crate::remote::gateway::TransportError;

    #[test]
    fn decodes_places_envelope_in_order() {
        let body = br#"{"places":[
            {"id":"p1","title":"Forest","image":{"src":"forest.jpg","alt":"A forest"},"lat":44.5,"lon":11.3},
            {"id":"p2","title":"Lake","image":{"src":"lake.jpg","alt":"A lake"},"lat":46.1,"lon":8.9}
        ]}"#;
        let places = decode_places_response(body).expect("valid envelope");
        let ids: Vec<_> = places.iter().map(|place| place.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(places[1].image.alt, "A lake");
    }

    #[test]
    fn rejects_body_without_envelope() {
        let err = decode_places_response(b"[]").expect_err("bare array is not the envelope");
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn association_request_uses_camel_case_key() {
        let bytes = encode_association_request(&PlaceId::from("p3")).expect("encode");
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"placeId":"p3"}"#);
    }
}
