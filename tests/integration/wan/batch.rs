use std::error::Error as _;
use std::io;

use gateway_events::wan::BatchFailureError;
use gateway_events::{BatchFailure, Error, Transience};

#[test]
fn aggregate_keeps_per_event_attribution() {
    let f1 = BatchFailure::at_index("region /orders missing", 0, 17);
    let f2 = BatchFailure::from_cause_in_batch(io::Error::other("value rejected"), 4, 17);
    let f3 = BatchFailure::with_message_and_cause(
        "key rejected",
        io::Error::new(io::ErrorKind::InvalidData, "bad key"),
        6,
        17,
    );
    let aggregate = BatchFailure::aggregate(vec![f1.clone(), f2.clone(), f3.clone()])
        .expect("aggregate");

    assert_eq!(aggregate.index(), f1.index());
    assert_eq!(aggregate.batch_id(), f1.batch_id());
    assert_eq!(aggregate.message(), f1.message());
    assert_eq!(aggregate.sub_failures(), &[f1, f2, f3]);
    assert_eq!(aggregate.failed_indices(), vec![0, 4, 6]);
    assert_eq!(
        aggregate.sub_failures()[2]
            .source()
            .map(ToString::to_string)
            .as_deref(),
        Some("bad key")
    );
}

#[test]
fn aggregates_can_be_shipped_across_threads() {
    let failure = BatchFailure::aggregate(vec![
        BatchFailure::at_index("a", 1, 3),
        BatchFailure::from_cause(io::Error::other("b"), 2),
    ])
    .expect("aggregate");
    let indices = std::thread::spawn(move || failure.failed_indices())
        .join()
        .expect("join");
    assert_eq!(indices, vec![1, 2]);
}

#[test]
fn empty_aggregate_surfaces_as_crate_error() {
    let err: Error = BatchFailure::aggregate(Vec::new()).unwrap_err().into();
    assert!(matches!(err, Error::Batch(BatchFailureError::Empty)));
    assert_eq!(err.transience(), Transience::Permanent);
}
