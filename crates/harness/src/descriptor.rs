//! The parsed transform descriptor a runner executes.

use crate::element::{ElementInputCodec, ElementShape, InputOf};
use crate::user_fn::UserFn;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tandem_coders::{Codec, WindowedValueCodec};
use tandem_core::{Error, Result, TimeDomain, Timer, Window, WindowedValue, WindowingStrategy, KV};
use tandem_protocol::urns;
use tandem_state::SideInputSpec;

/// The six execution modes, selected by the transform's URN. The mode picks
/// both the element-shape parser and the output wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrnMode {
    ParDo,
    PairWithRestriction,
    SplitRestriction,
    SplitAndSizeRestrictions,
    ProcessElements,
    ProcessSizedElementsAndRestrictions,
}

impl UrnMode {
    pub fn from_urn(urn: &str) -> Result<Self> {
        match urn {
            urns::PAR_DO => Ok(UrnMode::ParDo),
            urns::PAIR_WITH_RESTRICTION => Ok(UrnMode::PairWithRestriction),
            urns::SPLIT_RESTRICTION => Ok(UrnMode::SplitRestriction),
            urns::SPLIT_AND_SIZE_RESTRICTIONS => Ok(UrnMode::SplitAndSizeRestrictions),
            urns::PROCESS_ELEMENTS => Ok(UrnMode::ProcessElements),
            urns::PROCESS_SIZED_ELEMENTS_AND_RESTRICTIONS => {
                Ok(UrnMode::ProcessSizedElementsAndRestrictions)
            }
            other => Err(Error::configuration(format!("unknown transform urn {other:?}"))),
        }
    }

    pub fn urn(self) -> &'static str {
        match self {
            UrnMode::ParDo => urns::PAR_DO,
            UrnMode::PairWithRestriction => urns::PAIR_WITH_RESTRICTION,
            UrnMode::SplitRestriction => urns::SPLIT_RESTRICTION,
            UrnMode::SplitAndSizeRestrictions => urns::SPLIT_AND_SIZE_RESTRICTIONS,
            UrnMode::ProcessElements => urns::PROCESS_ELEMENTS,
            UrnMode::ProcessSizedElementsAndRestrictions => {
                urns::PROCESS_SIZED_ELEMENTS_AND_RESTRICTIONS
            }
        }
    }

    /// The shape of elements this mode consumes from its main input.
    pub fn input_shape(self) -> ElementShape {
        match self {
            UrnMode::ParDo | UrnMode::PairWithRestriction => ElementShape::Bare,
            UrnMode::SplitRestriction
            | UrnMode::SplitAndSizeRestrictions
            | UrnMode::ProcessElements => ElementShape::Paired,
            UrnMode::ProcessSizedElementsAndRestrictions => ElementShape::Sized,
        }
    }

    /// Modes whose sole main output carries restriction artifacts rather
    /// than user-emitted values.
    pub fn emits_restriction_artifacts(self) -> bool {
        matches!(
            self,
            UrnMode::PairWithRestriction
                | UrnMode::SplitRestriction
                | UrnMode::SplitAndSizeRestrictions
        )
    }

    /// Modes that run user `process_element` over a claimed restriction and
    /// support mid-bundle self-splitting.
    pub fn is_splittable_process(self) -> bool {
        matches!(
            self,
            UrnMode::ProcessElements | UrnMode::ProcessSizedElementsAndRestrictions
        )
    }

    /// Any of the five splittable modes.
    pub fn is_splittable(self) -> bool {
        self != UrnMode::ParDo
    }
}

/// One declared timer family: its time domain and the codec its records
/// travel the timer plane in.
pub struct TimerFamilySpec<K> {
    pub time_domain: TimeDomain,
    pub codec: Arc<dyn Codec<Timer<K>>>,
}

impl<K> Clone for TimerFamilySpec<K> {
    fn clone(&self) -> Self {
        Self {
            time_domain: self.time_domain,
            codec: self.codec.clone(),
        }
    }
}

/// Everything parsed out of a transform's payload, validated once at
/// construction.
pub struct TransformDescriptor<F: UserFn> {
    pub transform_id: String,
    pub mode: UrnMode,
    pub main_input_id: String,
    pub main_output_tag: String,
    /// Output tag name to collection id, in deterministic order.
    pub outputs: BTreeMap<String, String>,
    pub side_inputs: HashMap<String, SideInputSpec>,
    pub timer_families: HashMap<String, TimerFamilySpec<F::Key>>,
    pub windowing: WindowingStrategy,
    pub element_codec: Arc<dyn Codec<F::In>>,
    pub restriction_codec: Option<Arc<dyn Codec<KV<F::Restriction, F::WatermarkState>>>>,
    pub window_codec: Arc<dyn Codec<Window>>,
    pub key_codec: Option<Arc<dyn Codec<F::Key>>>,
}

impl<F: UserFn> TransformDescriptor<F> {
    pub fn builder(transform_id: impl Into<String>) -> TransformDescriptorBuilder<F> {
        TransformDescriptorBuilder::new(transform_id)
    }

    /// The full windowed-value codec over the main input, as used for split
    /// artifacts.
    pub fn full_input_codec(&self) -> Arc<dyn Codec<WindowedValue<InputOf<F>>>> {
        let value: Arc<dyn Codec<InputOf<F>>> = Arc::new(ElementInputCodec::new(
            self.mode.input_shape(),
            self.element_codec.clone(),
            self.restriction_codec.clone(),
        ));
        Arc::new(WindowedValueCodec::new(value, self.window_codec.clone()))
    }
}

/// Builds and validates a [`TransformDescriptor`].
pub struct TransformDescriptorBuilder<F: UserFn> {
    transform_id: String,
    urn: Option<String>,
    main_input_id: Option<String>,
    main_output_tag: Option<String>,
    outputs: BTreeMap<String, String>,
    side_inputs: HashMap<String, SideInputSpec>,
    timer_families: HashMap<String, TimerFamilySpec<F::Key>>,
    windowing: WindowingStrategy,
    element_codec: Option<Arc<dyn Codec<F::In>>>,
    restriction_codec: Option<Arc<dyn Codec<KV<F::Restriction, F::WatermarkState>>>>,
    window_codec: Option<Arc<dyn Codec<Window>>>,
    key_codec: Option<Arc<dyn Codec<F::Key>>>,
}

impl<F: UserFn> TransformDescriptorBuilder<F> {
    fn new(transform_id: impl Into<String>) -> Self {
        Self {
            transform_id: transform_id.into(),
            urn: None,
            main_input_id: None,
            main_output_tag: None,
            outputs: BTreeMap::new(),
            side_inputs: HashMap::new(),
            timer_families: HashMap::new(),
            windowing: WindowingStrategy::default(),
            element_codec: None,
            restriction_codec: None,
            window_codec: None,
            key_codec: None,
        }
    }

    pub fn urn(mut self, urn: impl Into<String>) -> Self {
        self.urn = Some(urn.into());
        self
    }

    pub fn mode(self, mode: UrnMode) -> Self {
        self.urn(mode.urn())
    }

    pub fn main_input(mut self, collection_id: impl Into<String>) -> Self {
        self.main_input_id = Some(collection_id.into());
        self
    }

    pub fn output(mut self, tag: impl Into<String>, collection_id: impl Into<String>) -> Self {
        self.outputs.insert(tag.into(), collection_id.into());
        self
    }

    pub fn main_output_tag(mut self, tag: impl Into<String>) -> Self {
        self.main_output_tag = Some(tag.into());
        self
    }

    pub fn side_input(mut self, tag: impl Into<String>, spec: SideInputSpec) -> Self {
        self.side_inputs.insert(tag.into(), spec);
        self
    }

    pub fn timer_family(
        mut self,
        family: impl Into<String>,
        time_domain: TimeDomain,
        codec: Arc<dyn Codec<Timer<F::Key>>>,
    ) -> Self {
        self.timer_families
            .insert(family.into(), TimerFamilySpec { time_domain, codec });
        self
    }

    pub fn windowing(mut self, windowing: WindowingStrategy) -> Self {
        self.windowing = windowing;
        self
    }

    pub fn element_codec(mut self, codec: Arc<dyn Codec<F::In>>) -> Self {
        self.element_codec = Some(codec);
        self
    }

    pub fn restriction_codec(
        mut self,
        codec: Arc<dyn Codec<KV<F::Restriction, F::WatermarkState>>>,
    ) -> Self {
        self.restriction_codec = Some(codec);
        self
    }

    pub fn window_codec(mut self, codec: Arc<dyn Codec<Window>>) -> Self {
        self.window_codec = Some(codec);
        self
    }

    pub fn key_codec(mut self, codec: Arc<dyn Codec<F::Key>>) -> Self {
        self.key_codec = Some(codec);
        self
    }

    pub fn build(self) -> Result<TransformDescriptor<F>> {
        let urn = self
            .urn
            .ok_or_else(|| Error::configuration("transform payload carries no urn"))?;
        let mode = UrnMode::from_urn(&urn)?;

        let main_input_id = self
            .main_input_id
            .ok_or_else(|| Error::configuration("transform has no main input"))?;
        if self.outputs.is_empty() {
            return Err(Error::configuration("transform declares no outputs"));
        }

        let main_output_tag = if mode.emits_restriction_artifacts() {
            if self.outputs.len() != 1 {
                return Err(Error::configuration(format!(
                    "{} requires exactly one output, found {}",
                    mode.urn(),
                    self.outputs.len()
                )));
            }
            let sole = self.outputs.keys().next().cloned().expect("one output");
            match self.main_output_tag {
                Some(tag) if tag != sole => {
                    return Err(Error::configuration(format!(
                        "main output tag {tag:?} does not name the sole output {sole:?}"
                    )))
                }
                _ => sole,
            }
        } else {
            let tag = self
                .main_output_tag
                .ok_or_else(|| Error::configuration("transform has no main output tag"))?;
            if !self.outputs.contains_key(&tag) {
                return Err(Error::configuration(format!(
                    "main output tag {tag:?} is not a declared output"
                )));
            }
            tag
        };

        for (tag, spec) in &self.side_inputs {
            if spec.materialization != urns::MULTIMAP_MATERIALIZATION {
                return Err(Error::configuration(format!(
                    "side input {tag:?} uses materialization {:?}; only {:?} is supported",
                    spec.materialization,
                    urns::MULTIMAP_MATERIALIZATION
                )));
            }
        }

        if mode.is_splittable() && self.restriction_codec.is_none() {
            return Err(Error::configuration(format!(
                "{} requires a restriction codec",
                mode.urn()
            )));
        }
        if !self.timer_families.is_empty() && self.key_codec.is_none() {
            return Err(Error::configuration(
                "transforms with timer families require a key codec",
            ));
        }

        let element_codec = self
            .element_codec
            .ok_or_else(|| Error::configuration("transform has no main-input element codec"))?;
        let window_codec = self
            .window_codec
            .ok_or_else(|| Error::configuration("transform has no window codec"))?;

        Ok(TransformDescriptor {
            transform_id: self.transform_id,
            mode,
            main_input_id,
            main_output_tag,
            outputs: self.outputs,
            side_inputs: self.side_inputs,
            timer_families: self.timer_families,
            windowing: self.windowing,
            element_codec,
            restriction_codec: self.restriction_codec,
            window_codec,
            key_codec: self.key_codec,
        })
    }
}
