use dmxp_tally::error::DecodeError;
use dmxp_tally::Wire::Structs::{Command, DigitHistogram, Message};
use dmxp_tally::Wire::{decode, encode};

fn round_trip(line: &str) {
    let message = decode(line)
        .unwrap_or_else(|e| panic!("{line:?} failed to decode: {e}"))
        .unwrap_or_else(|| panic!("{line:?} decoded as unknown"));
    assert_eq!(encode(&message), line);
}

#[test]
fn every_kind_round_trips() {
    round_trip("MESSAGE|READY|3");
    round_trip("COMMAND|START");
    round_trip("COMMAND|COUNT");
    round_trip("COMMAND|STOP");
    round_trip("MESSAGE|COUNT|1|9,4,7,20,12,4,19,9,10,8|102");
    round_trip("MESSAGE|COUNT|0|0,0,0,0,0,0,0,0,0,0|0");
    round_trip("MESSAGE|LOG|2|5|buffer full, dropped digit 7");
    round_trip("MESSAGE|LOG|2|-|process level note");
}

#[test]
fn decodes_fields() {
    assert_eq!(
        decode("MESSAGE|READY|7"),
        Ok(Some(Message::Ready { process_id: 7 }))
    );
    assert_eq!(
        decode("MESSAGE|LOG|1|-|hello"),
        Ok(Some(Message::Log {
            process_id: 1,
            thread_id: None,
            text: "hello".into()
        }))
    );

    let Ok(Some(Message::Count { process_id, histogram })) =
        decode("MESSAGE|COUNT|4|3,2,0,0,0,0,0,0,0,1|6\n")
    else {
        panic!("expected a COUNT message");
    };
    assert_eq!(process_id, 4);
    assert_eq!(histogram[0], 3);
    assert_eq!(histogram[1], 2);
    assert_eq!(histogram[9], 1);
    assert_eq!(histogram.total(), 6);
}

#[test]
fn log_text_may_contain_separators() {
    let line = "MESSAGE|LOG|0|1|a|b|c";
    assert_eq!(
        decode(line),
        Ok(Some(Message::log(0, Some(1), "a|b|c")))
    );
    round_trip(line);
}

#[test]
fn log_text_newlines_are_flattened() {
    let line = encode(&Message::log(0, None, "two\nlines"));
    assert_eq!(line, "MESSAGE|LOG|0|-|two lines");
}

#[test]
fn commands_parse_case_insensitively() {
    assert_eq!(decode("COMMAND|count"), Ok(Some(Message::Command(Command::Count))));
    assert_eq!(decode("COMMAND| Stop \r\n"), Ok(Some(Message::Command(Command::Stop))));
    assert_eq!(encode(&Message::Command(Command::Start)), "COMMAND|START");
}

#[test]
fn unknown_prefixes_are_ignored() {
    assert_eq!(decode(""), Ok(None));
    assert_eq!(decode("hello world"), Ok(None));
    assert_eq!(decode("MESSAGE|HEARTBEAT|1"), Ok(None));
    assert_eq!(decode("MESSAGE"), Ok(None));
    assert_eq!(decode("message|READY|1"), Ok(None));
}

#[test]
fn malformed_known_kinds_are_errors() {
    assert!(matches!(
        decode("MESSAGE|READY"),
        Err(DecodeError::FieldCount { expected: 3, found: 2, .. })
    ));
    assert!(matches!(
        decode("MESSAGE|READY|x"),
        Err(DecodeError::InvalidNumber { field: "processId", .. })
    ));
    assert!(matches!(
        decode("MESSAGE|COUNT|1|1,2,3|6"),
        Err(DecodeError::BucketCount { found: 3 })
    ));
    assert!(matches!(
        decode("MESSAGE|COUNT|1|1,2,3,0,0,0,0,0,0,a|6"),
        Err(DecodeError::InvalidNumber { field: "bucket", .. })
    ));
    assert!(matches!(
        decode("MESSAGE|COUNT|1|1,0,0,0,0,0,0,0,0,0|2"),
        Err(DecodeError::TotalMismatch { declared: 2, actual: 1 })
    ));
    assert!(matches!(
        decode("MESSAGE|COUNT|1|1,0,0,0,0,0,0,0,0,0"),
        Err(DecodeError::FieldCount { .. })
    ));
    assert!(matches!(
        decode("MESSAGE|LOG|1|-"),
        Err(DecodeError::FieldCount { .. })
    ));
    assert!(matches!(
        decode("MESSAGE|LOG|1|t|text"),
        Err(DecodeError::InvalidNumber { field: "threadId", .. })
    ));
    assert!(matches!(decode("COMMAND"), Err(DecodeError::FieldCount { .. })));
    assert!(matches!(decode("COMMAND|PAUSE"), Err(DecodeError::UnknownCommand(_))));
    assert!(matches!(decode("COMMAND|START|now"), Err(DecodeError::FieldCount { .. })));
}

#[test]
fn histogram_merge_and_total() {
    let mut a = DigitHistogram::from_digits(&[0, 0, 1, 9]);
    let b = DigitHistogram::from_digits(&[0, 5, 5]);
    a.merge(&b);

    assert_eq!(a[0], 3);
    assert_eq!(a[1], 1);
    assert_eq!(a[5], 2);
    assert_eq!(a[9], 1);
    assert_eq!(a.total(), 7);

    let mut c = DigitHistogram::new();
    assert!(!c.record(10));
    assert_eq!(c.total(), 0);
}

#[test]
fn count_buckets_overflowing_the_total_are_rejected() {
    assert_eq!(
        decode("MESSAGE|COUNT|0|18446744073709551615,1,0,0,0,0,0,0,0,0|0"),
        Err(DecodeError::CountOverflow)
    );
    assert_eq!(
        decode("MESSAGE|COUNT|0|18446744073709551615,0,0,0,0,0,0,0,0,0|18446744073709551615")
            .map(|m| m.is_some()),
        Ok(true)
    );
}

#[test]
fn histogram_merge_saturates() {
    let mut a = DigitHistogram::from_buckets([u64::MAX, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    a.merge(&DigitHistogram::from_digits(&[0, 0]));
    assert_eq!(a[0], u64::MAX);
    assert_eq!(a.total(), u64::MAX);
    assert_eq!(a.checked_total(), None);
}
