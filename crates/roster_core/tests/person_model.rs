use chrono::NaiveDate;
use roster_core::model::validation::{
    MSG_INVALID_CONTENT, MSG_NOT_BLANK, MSG_NOT_NULL, MSG_PAST_DATE, MSG_PHONE,
};
use roster_core::{Person, PersonDraft};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 3, 15)
}

#[test]
fn person_serialization_uses_expected_wire_fields() {
    let person = Person::new("test@example.com", "John", "Doe", date(1991, 8, 24))
        .with_phone_number("1234567890");

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(json["email"], "test@example.com");
    assert_eq!(json["firstName"], "John");
    assert_eq!(json["lastName"], "Doe");
    assert_eq!(json["birthDate"], "24-08-1991");
    assert!(json["address"].is_null());
    assert_eq!(json["phoneNumber"], "1234567890");

    let decoded: Person = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, person);
}

#[test]
fn draft_deserializes_and_builds_person() {
    let draft: PersonDraft = serde_json::from_value(serde_json::json!({
        "email": "test@example.com",
        "firstName": "John",
        "lastName": "Doe",
        "birthDate": "24-08-1991",
        "address": "123 Main St",
        "phoneNumber": "1234567890",
        "unknownField": true
    }))
    .unwrap();

    let person = draft.into_person(today()).unwrap();
    assert_eq!(person.birth_date, date(1991, 8, 24));
    assert_eq!(person.address.as_deref(), Some("123 Main St"));
}

#[test]
fn draft_rejects_iso_dates() {
    let result = serde_json::from_value::<PersonDraft>(serde_json::json!({
        "birthDate": "1991-08-24"
    }));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("dd-MM-yyyy"), "unexpected error: {err}");
}

#[test]
fn draft_reports_all_violations_together() {
    let draft: PersonDraft = serde_json::from_value(serde_json::json!({
        "firstName": " ",
        "lastName": "Doe",
        "birthDate": "15-03-2024",
        "phoneNumber": "12-34"
    }))
    .unwrap();

    let detail = draft.into_person(today()).unwrap_err();
    let pairs: Vec<_> = detail
        .violations
        .iter()
        .map(|v| (v.field.as_str(), v.message.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("email", MSG_NOT_BLANK),
            ("firstName", MSG_NOT_BLANK),
            ("birthDate", MSG_PAST_DATE),
            ("phoneNumber", MSG_PHONE),
        ]
    );
    assert!(detail.violations.iter().all(|v| v.object_name == "person"));
}

#[test]
fn draft_without_birth_date_reports_not_null() {
    let draft = PersonDraft {
        email: Some("a@x.com".to_string()),
        first_name: Some("Ann".to_string()),
        last_name: Some("Lee".to_string()),
        ..PersonDraft::default()
    };

    let detail = draft.into_person(today()).unwrap_err();
    assert_eq!(detail.message, MSG_INVALID_CONTENT);
    assert_eq!(detail.violations.len(), 1);
    assert_eq!(detail.violations[0].field, "birthDate");
    assert_eq!(detail.violations[0].message, MSG_NOT_NULL);
}
