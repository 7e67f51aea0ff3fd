//! Property-based serialization round-trip tests.
//!
//! Uses proptest to verify:
//! 1. Any valid `ClientMessage` survives encode → decode round-trip.
//! 2. Any valid `ServerMessage` survives encode → decode round-trip.
//! 3. Random bytes never cause a panic in decode (returns `Err` gracefully).
//! 4. Framed encode → decode round-trips correctly.

use proptest::prelude::*;
use taskdeck_proto::auth::{AuthErrorCode, FederatedProvider, UserProfile};
use taskdeck_proto::codec;
use taskdeck_proto::document::{Document, DocumentId, FieldValue, Fields, Timestamp};
use taskdeck_proto::query::{Direction, FieldFilter, Query};
use taskdeck_proto::wire::{ClientMessage, ServerMessage, SubscriptionId};
use uuid::Uuid;

// --- Arbitrary implementations for protocol types ---

/// Strategy for generating arbitrary `DocumentId` values.
fn arb_document_id() -> impl Strategy<Value = DocumentId> {
    any::<u128>().prop_map(|n| DocumentId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating arbitrary `SubscriptionId` values.
fn arb_subscription_id() -> impl Strategy<Value = SubscriptionId> {
    any::<u128>().prop_map(|n| SubscriptionId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating arbitrary `FieldValue` values.
/// Doubles are derived from integers to keep equality reflexive (no NaN).
fn arb_field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Integer),
        any::<i32>().prop_map(|n| FieldValue::Double(f64::from(n) / 8.0)),
        ".{0,64}".prop_map(FieldValue::Text),
        any::<u64>().prop_map(|ms| FieldValue::Timestamp(Timestamp::from_millis(ms))),
        Just(FieldValue::ServerTimestamp),
    ]
}

/// Strategy for generating arbitrary field maps.
fn arb_fields() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("[a-z_]{1,16}", arb_field_value(), 0..8)
}

/// Strategy for generating arbitrary `Document` values.
fn arb_document() -> impl Strategy<Value = Document> {
    (arb_document_id(), arb_fields()).prop_map(|(id, fields)| Document::new(id, fields))
}

/// Strategy for generating arbitrary `Query` values.
fn arb_query() -> impl Strategy<Value = Query> {
    (
        "[a-z]{1,12}",
        "[a-z_]{1,16}",
        arb_field_value(),
        "[a-z_]{1,16}",
        prop_oneof![Just(Direction::Ascending), Just(Direction::Descending)],
    )
        .prop_map(|(collection, field, value, order_by, direction)| Query {
            collection,
            filter: FieldFilter { field, value },
            order_by,
            direction,
        })
}

/// Strategy for generating arbitrary `UserProfile` values.
fn arb_user_profile() -> impl Strategy<Value = UserProfile> {
    (".{1,24}", ".{1,32}", prop::option::of(".{0,24}")).prop_map(
        |(uid, email, display_name)| UserProfile {
            uid,
            email,
            display_name,
        },
    )
}

/// Strategy for generating arbitrary `AuthErrorCode` values.
fn arb_auth_error_code() -> impl Strategy<Value = AuthErrorCode> {
    prop_oneof![
        Just(AuthErrorCode::EmailAlreadyRegistered),
        Just(AuthErrorCode::MalformedEmail),
        Just(AuthErrorCode::WeakPassword),
        Just(AuthErrorCode::PopupBlocked),
        Just(AuthErrorCode::NotSignedIn),
        Just(AuthErrorCode::Internal),
    ]
}

/// Strategy for generating arbitrary `ClientMessage` values.
fn arb_client_message() -> impl Strategy<Value = ClientMessage> {
    prop_oneof![
        Just(ClientMessage::Hello),
        (".{1,32}", ".{1,32}")
            .prop_map(|(email, password)| ClientMessage::SignUp { email, password }),
        Just(ClientMessage::SignInFederated {
            provider: FederatedProvider::Google
        }),
        ".{0,24}".prop_map(|display_name| ClientMessage::UpdateProfile { display_name }),
        Just(ClientMessage::SignOut),
        (arb_subscription_id(), arb_query()).prop_map(|(subscription_id, query)| {
            ClientMessage::Subscribe {
                subscription_id,
                query,
            }
        }),
        arb_subscription_id()
            .prop_map(|subscription_id| ClientMessage::Unsubscribe { subscription_id }),
        ("[a-z]{1,12}", arb_fields())
            .prop_map(|(collection, fields)| ClientMessage::Add { collection, fields }),
        ("[a-z]{1,12}", arb_document_id(), arb_fields()).prop_map(
            |(collection, document_id, fields)| ClientMessage::Update {
                collection,
                document_id,
                fields,
            }
        ),
        ("[a-z]{1,12}", arb_document_id()).prop_map(|(collection, document_id)| {
            ClientMessage::Delete {
                collection,
                document_id,
            }
        }),
    ]
}

/// Strategy for generating arbitrary `ServerMessage` values.
fn arb_server_message() -> impl Strategy<Value = ServerMessage> {
    prop_oneof![
        prop::option::of(arb_user_profile()).prop_map(|user| ServerMessage::AuthState { user }),
        arb_auth_error_code().prop_map(|code| ServerMessage::AuthRejected { code }),
        (arb_subscription_id(), prop::collection::vec(arb_document(), 0..8)).prop_map(
            |(subscription_id, documents)| ServerMessage::Snapshot {
                subscription_id,
                documents,
            }
        ),
        (arb_subscription_id(), ".{0,64}").prop_map(|(subscription_id, reason)| {
            ServerMessage::SubscriptionError {
                subscription_id,
                reason,
            }
        }),
        ".{0,64}".prop_map(|reason| ServerMessage::WriteFailed { reason }),
        ".{0,64}".prop_map(|reason| ServerMessage::Error { reason }),
    ]
}

// --- Property tests ---

proptest! {
    /// Any valid ClientMessage survives an encode → decode round-trip.
    #[test]
    fn client_message_round_trip(msg in arb_client_message()) {
        let bytes = codec::encode(&msg).expect("encode should succeed");
        let decoded: ClientMessage = codec::decode(&bytes).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
    }

    /// Any valid ServerMessage survives an encode → decode round-trip.
    #[test]
    fn server_message_round_trip(msg in arb_server_message()) {
        let bytes = codec::encode(&msg).expect("encode should succeed");
        let decoded: ServerMessage = codec::decode(&bytes).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
    }

    /// Any valid Document survives an encode → decode round-trip.
    #[test]
    fn document_round_trip(doc in arb_document()) {
        let bytes = codec::encode(&doc).expect("encode should succeed");
        let decoded: Document = codec::decode(&bytes).expect("decode should succeed");
        prop_assert_eq!(doc, decoded);
    }

    /// Random bytes never panic the decoder; they decode or error cleanly.
    #[test]
    fn decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode::<ServerMessage>(&bytes);
        let _ = codec::decode::<ClientMessage>(&bytes);
    }

    /// Framed encode → decode round-trips and reports consumed length.
    #[test]
    fn framed_round_trip(msg in arb_server_message()) {
        let framed = codec::encode_framed(&msg).expect("encode should succeed");
        let (decoded, consumed): (ServerMessage, usize) =
            codec::decode_framed(&framed).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
        prop_assert_eq!(consumed, framed.len());
    }

    /// A truncated frame errors instead of panicking.
    #[test]
    fn framed_truncation_is_an_error(msg in arb_server_message()) {
        let framed = codec::encode_framed(&msg).expect("encode should succeed");
        if framed.len() > 4 {
            let result: Result<(ServerMessage, usize), _> =
                codec::decode_framed(&framed[..framed.len() - 1]);
            prop_assert!(result.is_err());
        }
    }
}
