//! Generates the `relay.Relay` service stubs.
//!
//! Messages are hand-written prost structs in `src/rpc.rs`, so the service is
//! described with tonic-build's manual builder and no protoc is needed.

fn main() {
    let stream = tonic_build::manual::Method::builder()
        .name("stream")
        .route_name("Stream")
        .input_type("crate::rpc::MetricRecord")
        .output_type("crate::rpc::StreamSummary")
        .codec_path("tonic::codec::ProstCodec")
        .client_streaming()
        .build();

    let service = tonic_build::manual::Service::builder()
        .name("Relay")
        .package("relay")
        .method(stream)
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}
