//! Profile document parsing fed straight into the history, end to end.

use wattview::history::History;
use wattview::profile::{PowerProfile, ProfileError};

use crate::common::{profile_document, ts};

#[test]
fn test_parse_generated_document() {
    let document = profile_document(1451751190, &[550, 548, 1210, 538]);
    let profile = PowerProfile::parse(&document).unwrap();

    assert_eq!(profile.values.len(), 4);
    assert_eq!(profile.values.first(), Some(&550));
    assert_eq!(profile.values.last(), Some(&538));
    assert_eq!(profile.startts().timestamp(), 1451751190);
    assert_eq!(profile.endts.timestamp(), 1451751193);
}

#[test]
fn test_parsed_batches_merge_into_history() {
    let mut history = History::new(1000);

    let first = PowerProfile::parse(&profile_document(100, &[550, 548])).unwrap();
    history.add(&first);

    // next poll re-delivers the last second, as the device does
    let second = PowerProfile::parse(&profile_document(101, &[548, 560, 570])).unwrap();
    history.add(&second);

    assert_eq!(history.count(), 4);
    assert_eq!(history.startts(), Some(ts(100)));
    assert_eq!(history.get_sample(0).unwrap().value, Some(550));
    assert_eq!(history.get_sample(3).unwrap().value, Some(570));
}

#[test]
fn test_negative_feed_in_values_parse() {
    let document = profile_document(100, &[120, -340, 0]);
    let profile = PowerProfile::parse(&document).unwrap();

    assert_eq!(profile.values, vec![120, -340, 0]);
}

#[test]
fn test_malformed_document_is_an_error() {
    assert!(matches!(
        PowerProfile::parse("not xml at all"),
        Err(ProfileError::MissingHeader)
    ));
    assert!(matches!(
        PowerProfile::parse("<pollresp><header><pollid>1</pollid></header></pollresp>"),
        Err(ProfileError::MissingStartTimestamp)
    ));
}
