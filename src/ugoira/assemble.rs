use std::path::Path;

use image::{ImageReader, RgbaImage};
use tracing::{debug, info};

use super::{
    archive::FrameBundle,
    scratch::{ScratchSpace, SystemTemp},
};
use crate::{api::illust::FrameTimingMap, error::AssembleError, util};

/// Playback speed that leaves the delays as the page lists them.
pub const DEFAULT_SPEED: f64 = 1.0;

/* gif quantization effort, 1 (best) to 30 (fastest) */
const QUANTIZE_SPEED: i32 = 10;

/// Delay in centiseconds for a frame shown `duration_ms` at `speed`.
///
/// Halves round away from zero (15 ms becomes 2 cs); values past the gif
/// limit saturate at `u16::MAX`.
pub fn frame_delay(duration_ms: u32, speed: f64) -> u16 {
    let centiseconds = (f64::from(duration_ms) / 10.0 / speed).round();
    centiseconds.min(f64::from(u16::MAX)) as u16
}

pub struct AnimationFrame {
    pub image: RgbaImage,
    pub delay_cs: u16,
}

/// Decoded frames with their own delays, in playback order.
#[derive(Default)]
pub struct AnimationDocument {
    frames: Vec<AnimationFrame>,
}

impl AnimationDocument {
    pub fn push(&mut self, image: RgbaImage, delay_cs: u16) {
        self.frames.push(AnimationFrame { image, delay_cs });
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// Encode as an endlessly looping gif sized to the largest frame.
    pub fn encode_gif(&self) -> Result<Vec<u8>, AssembleError> {
        let width = self.frames.iter().map(|f| f.image.width()).max().unwrap_or(0);
        let height = self.frames.iter().map(|f| f.image.height()).max().unwrap_or(0);
        let (width, height) = gif_size(width, height)?;

        let mut out = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut out, width, height, &[]).map_err(encode_failed)?;
            encoder
                .set_repeat(gif::Repeat::Infinite)
                .map_err(encode_failed)?;

            for frame in &self.frames {
                let (w, h) = gif_size(frame.image.width(), frame.image.height())?;
                let mut pixels = frame.image.as_raw().clone();
                let mut gif_frame = gif::Frame::from_rgba_speed(w, h, &mut pixels, QUANTIZE_SPEED);
                gif_frame.delay = frame.delay_cs;
                gif_frame.dispose = gif::DisposalMethod::Background;
                encoder.write_frame(&gif_frame).map_err(encode_failed)?;
            }
        }
        Ok(out)
    }
}

fn gif_size(width: u32, height: u32) -> Result<(u16, u16), AssembleError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(AssembleError::EncodeFailed(format!(
            "frame of {}x{} exceeds the gif canvas limit",
            width, height
        ))),
    }
}

fn encode_failed(err: impl std::fmt::Display) -> AssembleError {
    AssembleError::EncodeFailed(err.to_string())
}

/// Turns a frame archive plus its timing table into an animated gif.
pub struct AnimationAssembler<S = SystemTemp> {
    scratch: S,
}

impl AnimationAssembler<SystemTemp> {
    pub fn new() -> Self {
        Self {
            scratch: SystemTemp,
        }
    }
}

impl Default for AnimationAssembler<SystemTemp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ScratchSpace> AnimationAssembler<S> {
    pub fn with_scratch(scratch: S) -> Self {
        Self { scratch }
    }

    /// Write the animation to `output`. Nothing is written unless every frame
    /// has a timing, every timing has a frame, and encoding succeeds.
    pub fn build(
        &self,
        output: &Path,
        archive: &[u8],
        timing: &FrameTimingMap,
        speed: f64,
    ) -> Result<(), AssembleError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(AssembleError::InvalidSpeed(speed));
        }

        let bundle = FrameBundle::from_zip(archive)?;
        if bundle.is_empty() {
            return Err(AssembleError::EmptyBundle);
        }
        let delays = match_timing(&bundle, timing, speed)?;

        let scratch = self.scratch.acquire().map_err(AssembleError::Scratch)?;
        let paths = bundle
            .unpack_into(scratch.path())
            .map_err(AssembleError::Scratch)?;
        debug!(frames = paths.len(), dir = %scratch.path().display(), "Unpacked frames");

        let mut document = AnimationDocument::default();
        for (path, delay) in paths.iter().zip(delays) {
            let image = ImageReader::open(path)
                .and_then(|reader| reader.with_guessed_format())
                .map_err(encode_failed)?
                .decode()
                .map_err(|err| {
                    AssembleError::EncodeFailed(format!("{}: {}", path.display(), err))
                })?;
            document.push(image.to_rgba8(), delay);
        }

        let gif = document.encode_gif()?;
        util::write_atomically(output, &gif).map_err(encode_failed)?;

        info!(
            output = %output.display(),
            frames = document.frames().len(),
            bytes = gif.len(),
            speed,
            "Wrote animation"
        );
        Ok(())
    }
}

/* Delays in archive order; the table and the archive must name the same frames */
fn match_timing(
    bundle: &FrameBundle,
    timing: &FrameTimingMap,
    speed: f64,
) -> Result<Vec<u16>, AssembleError> {
    let delays = bundle
        .names()
        .map(|name| {
            timing
                .get(name)
                .map(|ms| frame_delay(ms, speed))
                .ok_or_else(|| AssembleError::TimingMissing(name.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if timing.len() != bundle.len() {
        let unused = timing
            .files()
            .find(|file| !bundle.names().any(|name| name == *file))
            .unwrap_or_default();
        return Err(AssembleError::FrameMissing(unused.to_owned()));
    }

    Ok(delays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_scales_with_speed() {
        assert_eq!(frame_delay(1000, 1.0), 100);
        assert_eq!(frame_delay(2000, 1.0), 200);
        assert_eq!(frame_delay(1000, 10.0), 10);
        assert_eq!(frame_delay(3000, 10.0), 30);
        assert_eq!(frame_delay(100, 0.5), 20);
    }

    #[test]
    fn delay_rounds_half_away_from_zero() {
        assert_eq!(frame_delay(15, 1.0), 2);
        assert_eq!(frame_delay(25, 1.0), 3);
        assert_eq!(frame_delay(14, 1.0), 1);
        assert_eq!(frame_delay(30, 2.0), 2);
        assert_eq!(frame_delay(4, 1.0), 0);
    }

    #[test]
    fn delay_saturates() {
        assert_eq!(frame_delay(u32::MAX, 1.0), u16::MAX);
        assert_eq!(frame_delay(1000, 0.0001), u16::MAX);
    }

    fn bundle(names: &[&str]) -> FrameBundle {
        let mut bundle = FrameBundle::default();
        for name in names {
            bundle.push(*name, Vec::new());
        }
        bundle
    }

    #[test]
    fn timing_follows_archive_order() {
        let timing: FrameTimingMap = [("a.jpg", 100), ("b.jpg", 200)].into_iter().collect();
        let delays = match_timing(&bundle(&["b.jpg", "a.jpg"]), &timing, 1.0).unwrap();
        assert_eq!(delays, [20, 10]);
    }

    #[test]
    fn timing_lookup_is_exact() {
        let timing: FrameTimingMap = [("000000.jpg", 100)].into_iter().collect();
        match match_timing(&bundle(&["000000.JPG"]), &timing, 1.0) {
            Err(AssembleError::TimingMissing(name)) => assert_eq!(name, "000000.JPG"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unused_timing_is_reported() {
        let timing: FrameTimingMap = [("a.jpg", 100), ("b.jpg", 200)].into_iter().collect();
        match match_timing(&bundle(&["a.jpg"]), &timing, 1.0) {
            Err(AssembleError::FrameMissing(name)) => assert_eq!(name, "b.jpg"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn gif_keeps_per_frame_delays() {
        let mut document = AnimationDocument::default();
        document.push(RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255])), 7);
        document.push(RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255])), 42);
        let gif = document.encode_gif().unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(gif.as_slice()).unwrap();
        let mut delays = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            delays.push(frame.delay);
        }
        assert_eq!(delays, [7, 42]);
    }
}
