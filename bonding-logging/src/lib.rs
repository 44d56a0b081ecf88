// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Emits a `trace` event named `$evt` with a JSON payload, e.g.
/// `bonding_trace!("staking.delegate", {"delegator": delegator.to_string()})`
#[macro_export]
macro_rules! bonding_trace {
    ($evt:expr, $params:tt) => {
        tracing::trace!("bonding_trace:{}:{}", $evt, serde_json::json!($params));
    };
}
