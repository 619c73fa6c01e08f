use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;
use ffmpeg_next::util::frame::audio::Audio as AudioFrame;
use ffmpeg_next::ChannelLayout;

use crate::audio::domain::audio_decoder::{AudioDecoder, DecodedAudio};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Decodes any container ffmpeg understands (flac, mp3, ogg, opus, m4a, ...)
/// at the stream's native rate and channel count.
pub struct FfmpegDecoder;

impl AudioDecoder for FfmpegDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio> {
        let decode_error = |e: ffmpeg_next::Error| AugmentError::Decode {
            path: path.to_path_buf(),
            source: Box::new(e),
        };

        ffmpeg_next::init().map_err(decode_error)?;
        let mut ictx = ffmpeg_next::format::input(path).map_err(decode_error)?;

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| AugmentError::Decode {
                path: path.to_path_buf(),
                source: "no audio stream".into(),
            })?;
        let audio_stream_index = audio_stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(
            audio_stream.parameters(),
        )
        .map_err(decode_error)?;
        let mut decoder = codec_ctx.decoder().audio().map_err(decode_error)?;

        let channels = decoder.channels() as usize;
        let layout = if decoder.channel_layout().is_empty() {
            ChannelLayout::default(channels as i32)
        } else {
            decoder.channel_layout()
        };
        let sample_rate = decoder.rate();

        // Packed f32 keeps frames interleaved in plane 0.
        let mut converter = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            layout,
            sample_rate,
            Sample::F32(SampleType::Packed),
            layout,
            sample_rate,
        )
        .map_err(decode_error)?;

        let mut interleaved: Vec<f32> = Vec::new();
        let mut decoded_frame = AudioFrame::empty();
        let mut converted_frame = AudioFrame::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }
            decoder.send_packet(&packet).map_err(decode_error)?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                converter
                    .run(&decoded_frame, &mut converted_frame)
                    .map_err(decode_error)?;
                extract_packed_f32(&converted_frame, channels, &mut interleaved);
            }
        }

        decoder.send_eof().map_err(decode_error)?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            converter
                .run(&decoded_frame, &mut converted_frame)
                .map_err(decode_error)?;
            extract_packed_f32(&converted_frame, channels, &mut interleaved);
        }

        if let Ok(Some(delay)) = converter.flush(&mut converted_frame) {
            if delay.output > 0 {
                extract_packed_f32(&converted_frame, channels, &mut interleaved);
            }
        }

        let waveform = Waveform::from_interleaved(&interleaved, channels.max(1))?;
        Ok(DecodedAudio {
            waveform,
            sample_rate,
        })
    }
}

fn extract_packed_f32(frame: &AudioFrame, channels: usize, out: &mut Vec<f32>) {
    let count = frame.samples() * channels;
    if count == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, count) };
    out.extend_from_slice(floats);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonexistent_file_is_decode_error() {
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\noise.flac")
        } else {
            Path::new("/nonexistent/noise.flac")
        };
        assert!(matches!(
            FfmpegDecoder.decode(path),
            Err(AugmentError::Decode { .. })
        ));
    }
}
