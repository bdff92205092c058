//! Wire messages exchanged with the pipeline orchestrator.
//!
//! Split results and progress metrics cross a language boundary, so they are
//! protobuf messages. The transport that carries them (the progress and split
//! RPC layer) lives in the host worker; this crate only defines the payloads.

use bytes::Bytes;
use std::collections::HashMap;

/// Well-known URNs and label keys.
pub mod urns {
    // Transform execution modes.
    pub const PAR_DO: &str = "tandem:transform:pardo:v1";
    pub const PAIR_WITH_RESTRICTION: &str = "tandem:transform:sdf_pair_with_restriction:v1";
    pub const SPLIT_RESTRICTION: &str = "tandem:transform:sdf_split_restriction:v1";
    pub const SPLIT_AND_SIZE_RESTRICTIONS: &str =
        "tandem:transform:sdf_split_and_size_restrictions:v1";
    pub const PROCESS_ELEMENTS: &str = "tandem:transform:sdf_process_elements:v1";
    pub const PROCESS_SIZED_ELEMENTS_AND_RESTRICTIONS: &str =
        "tandem:transform:sdf_process_sized_elements_and_restrictions:v1";

    // Progress metrics.
    pub const WORK_COMPLETED: &str = "tandem:metric:sdf_work_completed:v1";
    pub const WORK_REMAINING: &str = "tandem:metric:sdf_work_remaining:v1";
    pub const PROGRESS_TYPE: &str = "tandem:metrics:progress:v1";
    pub const TRANSFORM_LABEL: &str = "TRANSFORM";

    // Side-input materializations. Multimap is the only one this harness
    // implements.
    pub const MULTIMAP_MATERIALIZATION: &str = "tandem:side_input:multimap:v1";
}

/// A point in time as whole seconds plus nanoseconds within the second.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

impl Timestamp {
    pub fn from_epoch_millis(millis: i64) -> Self {
        Self {
            seconds: millis / 1000,
            nanos: ((millis % 1000) * 1_000_000) as i32,
        }
    }
}

/// A span of time as whole seconds plus nanoseconds.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Duration {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

impl Duration {
    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis / 1000,
            nanos: ((millis % 1000) * 1_000_000) as i32,
        }
    }
}

/// One encoded main-input element to re-apply to a transform.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BundleApplication {
    #[prost(string, tag = "1")]
    pub transform_id: String,
    #[prost(string, tag = "2")]
    pub input_id: String,
    /// The element encoded with the transform's full windowed-value codec.
    #[prost(bytes = "bytes", tag = "3")]
    pub element: Bytes,
}

/// A residual application the orchestrator should schedule after a delay.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DelayedBundleApplication {
    #[prost(message, optional, tag = "1")]
    pub application: Option<BundleApplication>,
    #[prost(message, optional, tag = "2")]
    pub requested_time_delay: Option<Duration>,
    /// Lower bound on the event-time output of each declared output, frozen
    /// before the split was taken. Absent when no watermark was observed.
    #[prost(map = "string, message", tag = "3")]
    pub output_watermarks: HashMap<String, Timestamp>,
}

/// A single metric reading reported to the orchestrator.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MonitoringInfo {
    #[prost(string, tag = "1")]
    pub urn: String,
    #[prost(string, tag = "2")]
    pub r#type: String,
    #[prost(map = "string, string", tag = "3")]
    pub labels: HashMap<String, String>,
    #[prost(bytes = "bytes", tag = "4")]
    pub payload: Bytes,
}
