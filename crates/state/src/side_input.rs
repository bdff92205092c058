//! Side-input materialization recipes.

use bytes::Bytes;
use std::any::Any;
use std::sync::Arc;
use tandem_coders::Codec;
use tandem_core::Window;

/// Materializes the raw bytes of a side-input read into the view value user
/// code observes.
pub type ViewFn = Arc<dyn Fn(Bytes) -> anyhow::Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Maps a main-input window to the side input's window.
pub type WindowMappingFn = Arc<dyn Fn(&Window) -> Window + Send + Sync>;

/// How one side input is read: its materialization, the codec of its windows,
/// the window mapping, and the view function.
#[derive(Clone)]
pub struct SideInputSpec {
    pub materialization: String,
    pub window_codec: Arc<dyn Codec<Window>>,
    pub window_mapping_fn: WindowMappingFn,
    pub view_fn: ViewFn,
}

impl SideInputSpec {
    /// A multimap-materialized side input, the only access pattern this
    /// harness supports.
    pub fn multimap(
        window_codec: Arc<dyn Codec<Window>>,
        window_mapping_fn: WindowMappingFn,
        view_fn: ViewFn,
    ) -> Self {
        Self {
            materialization: tandem_protocol::urns::MULTIMAP_MATERIALIZATION.to_string(),
            window_codec,
            window_mapping_fn,
            view_fn,
        }
    }
}

/// Window mapping for side inputs windowed the same way as the main input.
pub fn identity_window_mapping() -> WindowMappingFn {
    Arc::new(|window| window.clone())
}

/// A view function that decodes the payload as a concatenation of encoded
/// elements and materializes them as a `Vec<T>`.
pub fn decoded_list_view<T>(codec: Arc<dyn Codec<T>>) -> ViewFn
where
    T: Send + Sync + 'static,
{
    Arc::new(move |raw: Bytes| {
        let mut input = &raw[..];
        let mut values = Vec::new();
        while !input.is_empty() {
            values.push(codec.decode(&mut input)?);
        }
        Ok(Box::new(values) as Box<dyn Any + Send + Sync>)
    })
}
