use json_coerce::schema::{self, Schema};
use json_coerce::{ConversionError, Data, Strictness, Type};
use serde_json::{json, Value};

const SCHEMA: &str = r#"{
    "root": "Webhook",
    "models": {
        "Webhook": { "fields": {
            "data": { "type": "Event", "attr": "required" },
            "meta": { "type": { "map": "mixed" }, "attr": "optional" }
        } },
        "Event": { "fields": {
            "id": { "type": "string", "attr": "required" },
            "eventType": { "type": "string", "attr": "required", "api_name": "event_type" },
            "occurredAt": { "type": "date-time", "attr": "required", "api_name": "occurred_at" },
            "recordType": { "type": { "enum": ["event"] }, "attr": "required", "api_name": "record_type" },
            "payload": {
                "type": {
                    "union": {
                        "message.sent": "MessagePayload",
                        "message.finalized": "MessagePayload",
                        "call.hangup": "HangupPayload"
                    },
                    "discriminator": "event_type"
                },
                "attr": "required"
            }
        } },
        "MessagePayload": { "fields": {
            "id": { "type": "string", "attr": "required" },
            "to": { "type": "array", "attr": "required", "as": { "list": "Recipient" } },
            "parts": { "type": "int", "attr": "optional" },
            "cost": { "type": "?Cost", "attr": "required" },
            "sentAt": { "type": "?date-time", "attr": "optional", "api_name": "sent_at" }
        } },
        "Recipient": { "fields": {
            "phoneNumber": { "type": "string", "attr": "required", "api_name": "phone_number" },
            "status": { "type": { "enum": ["queued", "sending", "sent", "delivered"] }, "attr": "required" }
        } },
        "Cost": { "fields": {
            "amount": { "type": "string", "attr": "required" },
            "currency": { "type": "string", "attr": "required" }
        } },
        "HangupPayload": { "fields": {
            "callControlId": { "type": "string", "attr": "required", "api_name": "call_control_id" },
            "hangupCause": { "type": "string", "attr": "required", "api_name": "hangup_cause" },
            "sipHangupCause": { "type": "?string", "attr": "api", "api_name": "sip_hangup_cause", "optional": true }
        } }
    }
}"#;

fn schema() -> Schema {
    schema::load_str(SCHEMA).expect("schema loads")
}

fn root(schema: &Schema) -> Type {
    schema.target(None).expect("schema has a root")
}

fn message_sent() -> Value {
    json!({
        "data": {
            "id": "b301ed3f-1490-491f-995f-6e64e69674d4",
            "event_type": "message.sent",
            "occurred_at": "2024-05-12T17:41:04.120+00:00",
            "record_type": "event",
            "payload": {
                "id": "40385f64-5717-4562-b3fc-2c963f66afa6",
                "to": [{"phone_number": "+18445550001", "status": "sent", "carrier": "T-MOBILE USA, INC."}],
                "parts": 1,
                "cost": {"amount": "0.0051", "currency": "USD"},
                "sent_at": "2024-05-12T17:41:04+00:00",
                "event_type": "message.sent"
            }
        },
        "meta": {"attempt": 1, "delivered_to": "https://example.com/webhooks"}
    })
}

#[test]
fn message_webhook_coerces_cleanly() {
    let schema = schema();
    let out = schema.registry.conversion().coerce_value(&root(&schema), message_sent());
    assert!(out.state.is_clean(), "{:?}", out.state);

    let payload = out.value.get("data").and_then(|d| d.get("payload")).and_then(Data::as_model).unwrap();
    assert_eq!(payload.type_name(), "MessagePayload");
    assert!(matches!(payload.get("sentAt"), Some(Data::DateTime(_))));

    let Some(Data::List(to)) = payload.get("to") else { panic!("`to` should be a list") };
    let recipient = to[0].as_model().unwrap();
    assert_eq!(recipient.type_name(), "Recipient");
    assert_eq!(recipient.get("phoneNumber"), Some(&Data::from("+18445550001")));
    // undeclared keys are kept as-is
    assert_eq!(recipient.get("carrier"), Some(&Data::from("T-MOBILE USA, INC.")));
}

#[test]
fn dump_restores_the_wire_payload() {
    let schema = schema();
    let cx = schema.registry.conversion();
    let ty = root(&schema);
    let coerced = cx.coerce_value(&ty, message_sent());
    let (dumped, state) = cx.dump_value(&ty, &coerced.value);
    assert_eq!(state.no, 0);
    assert_eq!(dumped, message_sent());

    let again = cx.coerce_value(&ty, dumped);
    assert_eq!(again.value, coerced.value);
}

#[test]
fn hangup_webhook_resolves_by_discriminator() {
    let schema = schema();
    let out = schema.registry.conversion().coerce_value(&root(&schema), json!({
        "data": {
            "id": "e1",
            "event_type": "call.hangup",
            "occurred_at": "2024-05-12T17:41:04Z",
            "record_type": "event",
            "payload": {
                "event_type": "call.hangup",
                "call_control_id": "v3:MdI91X4lWFEs7IgbBEOT9M4AigoY08M0WWZFISt1Yw2axZ_IiE4pqg",
                "hangup_cause": "normal_clearing"
            }
        }
    }));
    assert!(out.state.is_clean(), "{:?}", out.state);
    assert_eq!(out.state.branched, 0);
    let payload = out.value.get("data").and_then(|d| d.get("payload")).and_then(Data::as_model).unwrap();
    assert_eq!(payload.type_name(), "HangupPayload");
    assert_eq!(payload.get("sipHangupCause"), None);
}

#[test]
fn drift_is_reported_through_scores() {
    let schema = schema();
    let cx = schema.registry.conversion();
    let ty = root(&schema);

    // a delivery status this schema predates
    let mut drifted = message_sent();
    drifted["data"]["payload"]["to"][0]["status"] = json!("delivery_unconfirmed");
    let out = cx.coerce_value(&ty, drifted.clone());
    assert_eq!((out.state.maybe, out.state.no), (1, 0));
    assert!(cx.coerce_checked(&ty, drifted.clone(), Strictness::Lenient).is_ok());
    assert!(matches!(
        cx.coerce_checked(&ty, drifted, Strictness::Strict),
        Err(ConversionError::Rejected { maybe: 1, no: 0, .. })
    ));

    // `cost` is required but nullable: absent is a guess, not a mismatch
    let mut no_cost = message_sent();
    no_cost["data"]["payload"].as_object_mut().unwrap().remove("cost");
    let out = cx.coerce_value(&ty, no_cost);
    assert_eq!((out.state.maybe, out.state.no), (1, 0));

    // a timestamp that does not parse
    let mut bad_time = message_sent();
    bad_time["data"]["occurred_at"] = json!("yesterday");
    let out = cx.coerce_value(&ty, bad_time);
    assert_eq!(out.state.no, 1);
    assert_eq!(out.value.get("data").and_then(|d| d.get("occurredAt")), Some(&Data::from("yesterday")));
}

#[test]
fn documents_convert_concurrently_against_one_registry() {
    let schema = schema();
    let ty = root(&schema);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| schema.registry.conversion().coerce_value(&ty, message_sent())))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().state.is_clean());
        }
    });
}
