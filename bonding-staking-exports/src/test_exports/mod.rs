// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Staking module `test_exports`

mod recording;

pub use recording::{HookEvent, RecordingHooks};
