use proptest::prelude::*;

use gateway_events::config::SizingConfig;
use gateway_events::{CallbackArgument, ListenerOperation, SizeEstimator, Value};

use crate::fixtures::events::initialized;
use crate::fixtures::record::FakeRecord;

fn config() -> impl Strategy<Value = SizingConfig> {
    (0usize..64, 0usize..16, 0usize..128, 0usize..256, 0usize..16).prop_map(
        |(overhead, reference, identity, wrapper, header)| SizingConfig {
            per_object_overhead: overhead,
            reference_size: reference,
            identity_footprint: identity,
            callback_wrapper_footprint: wrapper,
            array_header: header,
        },
    )
}

fn callback() -> impl Strategy<Value = Option<CallbackArgument>> {
    proptest::option::of(prop_oneof![
        any::<i32>().prop_map(CallbackArgument::plain),
        "[a-z]{0,16}".prop_map(CallbackArgument::plain),
        Just(CallbackArgument::wrap(CallbackArgument::plain(Value::List(vec![
            Value::Int(1),
            Value::from("x"),
        ])))),
    ])
}

proptest! {
    #[test]
    fn estimate_grows_strictly_with_value_length(
        config in config(),
        short in 0usize..512,
        extra in 1usize..512,
        callback in callback(),
    ) {
        let estimator = SizeEstimator::new(config);
        let build = |len: usize| {
            let mut record = FakeRecord::new(1, 1).serialized_value(vec![7u8; len]);
            if let Some(arg) = callback.clone() {
                record = record.callback(arg);
            }
            initialized(ListenerOperation::AfterUpdate, record)
        };
        let smaller = build(short);
        let larger = build(short + extra);
        prop_assert!(estimator.estimate(&larger) > estimator.estimate(&smaller));
        prop_assert_eq!(estimator.estimate(&smaller), estimator.estimate(&smaller));
    }
}

#[test]
fn null_value_costs_less_than_empty_value() {
    let estimator = SizeEstimator::default();
    let null = initialized(ListenerOperation::AfterUpdate, FakeRecord::new(1, 1));
    let empty = initialized(
        ListenerOperation::AfterUpdate,
        FakeRecord::new(1, 2).serialized_value(Vec::new()),
    );
    assert!(estimator.estimate(&empty) > estimator.estimate(&null));
}

#[test]
fn wrapped_and_plain_callbacks_size_the_same() {
    let estimator = SizeEstimator::default();
    let plain = initialized(
        ListenerOperation::AfterCreate,
        FakeRecord::new(1, 1).callback(CallbackArgument::plain("cb")),
    );
    let wrapped = initialized(
        ListenerOperation::AfterCreate,
        FakeRecord::new(1, 2).callback(CallbackArgument::wrap(CallbackArgument::wrap(
            CallbackArgument::plain("cb"),
        ))),
    );
    assert_eq!(estimator.estimate(&plain), estimator.estimate(&wrapped));
}
