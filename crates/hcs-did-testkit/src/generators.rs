//! Proptest generators for property-based testing.

use proptest::prelude::*;

use hcs_did_core::{
    DidEvent, Ed25519PublicKey, Keypair, Network, RelationshipType, ServiceType, Signer, TopicId,
};

use crate::fixtures::DidFixture;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519PublicKey.
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a topic id.
pub fn topic_id() -> impl Strategy<Value = TopicId> {
    (0u64..4, 0u64..4, 1u64..=u32::MAX as u64).prop_map(|(s, r, n)| TopicId::new(s, r, n))
}

pub fn network() -> impl Strategy<Value = Network> {
    prop_oneof![
        Just(Network::Mainnet),
        Just(Network::Testnet),
        Just(Network::Previewnet),
    ]
}

pub fn relationship_type() -> impl Strategy<Value = RelationshipType> {
    proptest::sample::select(RelationshipType::ALL.to_vec())
}

pub fn service_type() -> impl Strategy<Value = ServiceType> {
    prop_oneof![Just(ServiceType::LinkedDomains), Just(ServiceType::DidCommMessaging)]
}

/// Generate a service endpoint URL.
pub fn endpoint() -> impl Strategy<Value = String> {
    "https://[a-z]{1,12}\\.example/[a-z0-9]{0,16}".prop_map(String::from)
}

/// Any event of `fixture`'s DID, owner events included.
pub fn did_event(fixture: &DidFixture) -> impl Strategy<Value = DidEvent> {
    let f = fixture.on_topic(fixture.topic_id);
    (0u8..12, 1u32..100, relationship_type(), service_type(), endpoint(), public_key()).prop_map(
        move |(variant, n, relationship, service, url, key)| {
            let event = match variant {
                0 => f.create_owner(),
                1 => f.update_owner(key),
                2 => f.create_service(n, &url),
                3 => f.update_service(n, &url),
                4 => f.revoke_service(n),
                5 => f.create_method(n, key),
                6 => f.update_method(n, key),
                7 => f.revoke_method(n),
                8 => f.create_relationship(n, relationship, key),
                9 => f.update_relationship(n, relationship, key),
                10 => f.revoke_relationship(n, relationship),
                _ => DidEvent::DeleteDocument,
            };
            with_service_type(event, service)
        },
    )
}

/// Any event that does not target the owner.
pub fn non_owner_event(fixture: &DidFixture) -> impl Strategy<Value = DidEvent> {
    did_event(fixture).prop_filter("owner events are excluded", |event| {
        !matches!(event, DidEvent::CreateOwner(_) | DidEvent::UpdateOwner(_))
    })
}

fn with_service_type(event: DidEvent, service_type: ServiceType) -> DidEvent {
    match event {
        DidEvent::CreateService(mut def) => {
            def.service_type = service_type;
            DidEvent::CreateService(def)
        }
        DidEvent::UpdateService(mut def) => {
            def.service_type = service_type;
            DidEvent::UpdateService(def)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs_did_core::{DidDocument, DidMessage, HcsDid};

    fn fixture() -> DidFixture {
        DidFixture::with_seed([0x42; 32])
    }

    proptest! {
        #[test]
        fn test_event_base64_round_trip(event in did_event(&fixture())) {
            let encoded = event.to_base64().unwrap();
            let decoded = DidEvent::from_base64(event.operation(), &encoded);

            prop_assert_eq!(decoded, Some(event));
        }

        #[test]
        fn test_message_json_round_trip(event in did_event(&fixture()), secs in 0i64..1_000_000) {
            let message = fixture().message(event, secs);
            let parsed = DidMessage::from_json(&message.to_json().unwrap()).unwrap();

            prop_assert_eq!(parsed, message);
        }

        #[test]
        fn test_did_round_trip(network in network(), key in public_key(), topic in topic_id()) {
            let did = HcsDid::from_public_key(network, &key, Some(topic));
            let parsed = HcsDid::parse(&did.to_string()).unwrap();

            prop_assert_eq!(parsed.public_key().unwrap(), key);
            prop_assert_eq!(parsed, did);
        }

        #[test]
        fn test_duplicate_messages_are_idempotent(
            events in prop::collection::vec(did_event(&fixture()), 0..12),
        ) {
            let f = fixture();
            let mut all = vec![f.create_owner()];
            all.extend(events);
            let messages = f.messages(all);

            let doubled: Vec<_> = messages
                .iter()
                .flat_map(|m| [m.clone(), m.clone()])
                .collect();

            let once = DidDocument::reduce(f.did_string(), &messages);
            let twice = DidDocument::reduce(f.did_string(), &doubled);

            prop_assert_eq!(once.to_json().unwrap(), twice.to_json().unwrap());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_nothing_applies_before_owner(
            events in prop::collection::vec(non_owner_event(&fixture()), 0..16),
        ) {
            let f = fixture();
            let document = DidDocument::reduce(f.did_string(), &f.messages(events));
            let empty = DidDocument::reduce(f.did_string(), &[]);

            prop_assert_eq!(document.to_json().unwrap(), empty.to_json().unwrap());
            prop_assert!(document.created().is_none());
            prop_assert!(document.version_id().is_none());
            prop_assert!(!document.deactivated());
        }

        #[test]
        fn test_signed_envelopes_verify_only_with_signer(event in did_event(&fixture()), other in keypair()) {
            let f = fixture();
            prop_assume!(other.public_key() != f.public_key());

            let envelope = f.signed(f.message(event, 0));
            prop_assert!(envelope.verify(|_| Some(f.public_key())));
            prop_assert!(!envelope.verify(|_| Some(other.public_key())));
        }
    }
}
