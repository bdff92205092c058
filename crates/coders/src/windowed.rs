//! Codecs for windows, panes, windowed values, and timers.

use crate::wire;
use crate::Codec;
use std::sync::Arc;
use tandem_core::{
    Error, Instant, IntervalWindow, PaneInfo, PaneTiming, Result, Timer, Window, WindowedValue,
};

const WINDOW_TAG_GLOBAL: u8 = 0;
const WINDOW_TAG_INTERVAL: u8 = 1;

/// Global or interval window.
pub struct WindowCodec;

impl Codec<Window> for WindowCodec {
    fn encode(&self, value: &Window, buf: &mut Vec<u8>) -> Result<()> {
        match value {
            Window::Global => wire::put_u8(buf, WINDOW_TAG_GLOBAL),
            Window::Interval(w) => {
                wire::put_u8(buf, WINDOW_TAG_INTERVAL);
                wire::put_i64(buf, w.start.millis());
                wire::put_i64(buf, w.end.millis());
            }
        }
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<Window> {
        match wire::read_u8(input)? {
            WINDOW_TAG_GLOBAL => Ok(Window::Global),
            WINDOW_TAG_INTERVAL => {
                let start = Instant::from_millis(wire::read_i64(input)?);
                let end = Instant::from_millis(wire::read_i64(input)?);
                Ok(Window::Interval(IntervalWindow::new(start, end)))
            }
            tag => Err(Error::codec(format!("unknown window tag {tag}"))),
        }
    }
}

/// Pane flags and timing in one byte, then the firing index.
pub struct PaneInfoCodec;

impl Codec<PaneInfo> for PaneInfoCodec {
    fn encode(&self, value: &PaneInfo, buf: &mut Vec<u8>) -> Result<()> {
        let timing = match value.timing {
            PaneTiming::Early => 0u8,
            PaneTiming::OnTime => 1,
            PaneTiming::Late => 2,
            PaneTiming::Unknown => 3,
        };
        let flags = (value.is_first as u8) | ((value.is_last as u8) << 1) | (timing << 2);
        wire::put_u8(buf, flags);
        wire::put_u32(buf, value.index);
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<PaneInfo> {
        let flags = wire::read_u8(input)?;
        let timing = match (flags >> 2) & 0x3 {
            0 => PaneTiming::Early,
            1 => PaneTiming::OnTime,
            2 => PaneTiming::Late,
            _ => PaneTiming::Unknown,
        };
        Ok(PaneInfo {
            timing,
            index: wire::read_u32(input)?,
            is_first: flags & 0x1 != 0,
            is_last: flags & 0x2 != 0,
        })
    }
}

fn encode_windows(
    windows: &[Window],
    codec: &dyn Codec<Window>,
    buf: &mut Vec<u8>,
) -> Result<()> {
    wire::put_i32(buf, windows.len() as i32);
    for window in windows {
        codec.encode(window, buf)?;
    }
    Ok(())
}

fn decode_windows(input: &mut &[u8], codec: &dyn Codec<Window>) -> Result<Vec<Window>> {
    let count = wire::read_i32(input)?;
    if count < 0 {
        return Err(Error::codec(format!("negative window count {count}")));
    }
    let mut windows = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        windows.push(codec.decode(input)?);
    }
    Ok(windows)
}

/// Full windowed-value layout: timestamp, windows, pane, then the value.
///
/// Only the split path needs this form; the raw value codec stays separate so
/// ordinary emission never pays for the envelope.
pub struct WindowedValueCodec<T> {
    value: Arc<dyn Codec<T>>,
    window: Arc<dyn Codec<Window>>,
}

impl<T> WindowedValueCodec<T> {
    pub fn new(value: Arc<dyn Codec<T>>, window: Arc<dyn Codec<Window>>) -> Self {
        Self { value, window }
    }
}

impl<T: Send + Sync + 'static> Codec<WindowedValue<T>> for WindowedValueCodec<T> {
    fn encode(&self, value: &WindowedValue<T>, buf: &mut Vec<u8>) -> Result<()> {
        wire::put_i64(buf, value.timestamp.millis());
        encode_windows(&value.windows, &*self.window, buf)?;
        PaneInfoCodec.encode(&value.pane, buf)?;
        self.value.encode(&value.value, buf)
    }

    fn decode(&self, input: &mut &[u8]) -> Result<WindowedValue<T>> {
        let timestamp = Instant::from_millis(wire::read_i64(input)?);
        let windows = decode_windows(input, &*self.window)?;
        let pane = PaneInfoCodec.decode(input)?;
        let value = self.value.decode(input)?;
        Ok(WindowedValue::new(value, timestamp, windows, pane))
    }
}

/// Timer record layout: key, dynamic tag, windows, fire and hold timestamps,
/// pane.
pub struct TimerCodec<K> {
    key: Arc<dyn Codec<K>>,
    window: Arc<dyn Codec<Window>>,
}

impl<K> TimerCodec<K> {
    pub fn new(key: Arc<dyn Codec<K>>, window: Arc<dyn Codec<Window>>) -> Self {
        Self { key, window }
    }
}

impl<K: Send + Sync + 'static> Codec<Timer<K>> for TimerCodec<K> {
    fn encode(&self, value: &Timer<K>, buf: &mut Vec<u8>) -> Result<()> {
        self.key.encode(&value.user_key, buf)?;
        crate::StringUtf8Codec.encode(&value.dynamic_tag, buf)?;
        encode_windows(&value.windows, &*self.window, buf)?;
        wire::put_i64(buf, value.fire_timestamp.millis());
        wire::put_i64(buf, value.hold_timestamp.millis());
        PaneInfoCodec.encode(&value.pane, buf)
    }

    fn decode(&self, input: &mut &[u8]) -> Result<Timer<K>> {
        let user_key = self.key.decode(input)?;
        let dynamic_tag = crate::StringUtf8Codec.decode(input)?;
        let windows = decode_windows(input, &*self.window)?;
        let fire_timestamp = Instant::from_millis(wire::read_i64(input)?);
        let hold_timestamp = Instant::from_millis(wire::read_i64(input)?);
        let pane = PaneInfoCodec.decode(input)?;
        Ok(Timer {
            user_key,
            dynamic_tag,
            windows,
            fire_timestamp,
            hold_timestamp,
            pane,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_exact, encode_to_bytes, StringUtf8Codec};

    #[test]
    fn test_windowed_value_roundtrip() {
        let codec = WindowedValueCodec::new(Arc::new(StringUtf8Codec), Arc::new(WindowCodec));
        let value = WindowedValue::of(
            "abc".to_string(),
            Instant::from_millis(10),
            Window::interval(Instant::from_millis(0), Instant::from_millis(100)),
            PaneInfo::ON_TIME,
        );
        let bytes = encode_to_bytes(&codec, &value).unwrap();
        assert_eq!(decode_exact(&codec, &bytes).unwrap(), value);
    }

    #[test]
    fn test_timer_roundtrip() {
        let codec = TimerCodec::new(Arc::new(StringUtf8Codec), Arc::new(WindowCodec));
        let timer = Timer {
            user_key: "k".to_string(),
            dynamic_tag: String::new(),
            windows: vec![Window::Global],
            fire_timestamp: Instant::from_millis(30),
            hold_timestamp: Instant::from_millis(20),
            pane: PaneInfo::NO_FIRING,
        };
        let bytes = encode_to_bytes(&codec, &timer).unwrap();
        assert_eq!(decode_exact(&codec, &bytes).unwrap(), timer);
    }
}
