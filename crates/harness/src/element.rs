//! Main-input element shapes.
//!
//! The six execution modes consume three input shapes: a bare element, an
//! element paired with its restriction and watermark-estimator state, and the
//! paired form annotated with a size. [`ElementInput`] is the tagged union
//! the data plane delivers; the SDF artifact shapes a transform emits are the
//! same nestings, so one codec covers both directions.

use crate::user_fn::UserFn;
use std::sync::Arc;
use tandem_coders::{wire, Codec};
use tandem_core::{Error, Result, KV};

/// Which [`ElementInput`] variant a mode consumes and produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementShape {
    Bare,
    Paired,
    Sized,
}

/// A main-input element in one of the three wire shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementInput<T, R, W> {
    /// `elem`
    Bare(T),
    /// `(elem, (restriction, watermarkState))`
    Paired(KV<T, KV<R, W>>),
    /// `((elem, (restriction, watermarkState)), size)`
    Sized(KV<KV<T, KV<R, W>>, f64>),
}

impl<T, R, W> ElementInput<T, R, W> {
    pub fn kind(&self) -> &'static str {
        match self {
            ElementInput::Bare(_) => "a bare element",
            ElementInput::Paired(_) => "an element/restriction pair",
            ElementInput::Sized(_) => "a sized element/restriction pair",
        }
    }
}

/// The element type a transform's main input carries.
pub type InputOf<F> =
    ElementInput<<F as UserFn>::In, <F as UserFn>::Restriction, <F as UserFn>::WatermarkState>;

/// Positional codec for [`ElementInput`]: the shape is fixed by the
/// transform's mode, so no tag byte goes on the wire.
pub struct ElementInputCodec<T, R, W> {
    shape: ElementShape,
    element: Arc<dyn Codec<T>>,
    restriction: Option<Arc<dyn Codec<KV<R, W>>>>,
}

impl<T, R, W> ElementInputCodec<T, R, W> {
    pub fn new(
        shape: ElementShape,
        element: Arc<dyn Codec<T>>,
        restriction: Option<Arc<dyn Codec<KV<R, W>>>>,
    ) -> Self {
        Self {
            shape,
            element,
            restriction,
        }
    }

    fn restriction_codec(&self) -> Result<&dyn Codec<KV<R, W>>> {
        self.restriction
            .as_deref()
            .ok_or_else(|| Error::codec("no restriction codec configured for this transform"))
    }
}

impl<T, R, W> Codec<ElementInput<T, R, W>> for ElementInputCodec<T, R, W>
where
    T: Send + Sync + 'static,
    R: Send + Sync + 'static,
    W: Send + Sync + 'static,
{
    fn encode(&self, value: &ElementInput<T, R, W>, buf: &mut Vec<u8>) -> Result<()> {
        match (self.shape, value) {
            (ElementShape::Bare, ElementInput::Bare(element)) => self.element.encode(element, buf),
            (ElementShape::Paired, ElementInput::Paired(pair)) => {
                self.element.encode(&pair.key, buf)?;
                self.restriction_codec()?.encode(&pair.value, buf)
            }
            (ElementShape::Sized, ElementInput::Sized(sized)) => {
                self.element.encode(&sized.key.key, buf)?;
                self.restriction_codec()?.encode(&sized.key.value, buf)?;
                wire::put_f64(buf, sized.value);
                Ok(())
            }
            (shape, value) => Err(Error::codec(format!(
                "cannot encode {} as a {shape:?} element",
                value.kind()
            ))),
        }
    }

    fn decode(&self, input: &mut &[u8]) -> Result<ElementInput<T, R, W>> {
        match self.shape {
            ElementShape::Bare => Ok(ElementInput::Bare(self.element.decode(input)?)),
            ElementShape::Paired => {
                let element = self.element.decode(input)?;
                let pair = self.restriction_codec()?.decode(input)?;
                Ok(ElementInput::Paired(KV::of(element, pair)))
            }
            ElementShape::Sized => {
                let element = self.element.decode(input)?;
                let pair = self.restriction_codec()?.decode(input)?;
                let size = wire::read_f64(input)?;
                Ok(ElementInput::Sized(KV::of(KV::of(element, pair), size)))
            }
        }
    }
}
