use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::waveform::Waveform;

/// One audio track of a container, as reported by `--inspect`.
#[derive(Clone, Debug)]
pub struct TrackInfo {
    /// Position among the audio tracks (what `--track` selects)
    pub index: usize,
    /// Container-level track id
    pub id: u32,
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub frames: Option<u64>,
    pub duration: Option<f64>,
    pub language: Option<String>,
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open media file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe media format: {}", path.display()))?;

    Ok(probed.format)
}

fn audio_tracks(format: &dyn FormatReader) -> Vec<&Track> {
    format
        .tracks()
        .iter()
        .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .collect()
}

fn duration_secs(params: &CodecParameters) -> Option<f64> {
    let frames = params.n_frames?;
    if let Some(tb) = params.time_base {
        let time = tb.calc_time(frames);
        return Some(time.seconds as f64 + time.frac);
    }
    params.sample_rate.map(|sr| frames as f64 / sr as f64)
}

/// List the audio tracks of an audio or video container.
pub fn inspect_tracks(path: &Path) -> Result<Vec<TrackInfo>> {
    let format = open_format(path)?;
    let codecs = symphonia::default::get_codecs();

    let tracks = audio_tracks(&*format)
        .into_iter()
        .enumerate()
        .map(|(index, track)| {
            let params = &track.codec_params;
            let codec = codecs
                .get_codec(params.codec)
                .map(|d| d.short_name.to_string())
                .unwrap_or_else(|| format!("{:?}", params.codec));
            TrackInfo {
                index,
                id: track.id,
                codec,
                sample_rate: params.sample_rate,
                channels: params.channels.map(|c| c.count()),
                frames: params.n_frames,
                duration: duration_secs(params),
                language: track.language.clone(),
            }
        })
        .collect();

    Ok(tracks)
}

/// Decode the `track_index`-th audio track of `path` and downmix it to mono.
pub fn decode_audio(path: &Path, track_index: usize) -> Result<Waveform> {
    let mut format = open_format(path)?;

    let tracks = audio_tracks(&*format);
    if tracks.is_empty() {
        anyhow::bail!("No audio tracks found in {}", path.display());
    }
    let track = tracks.get(track_index).with_context(|| {
        format!(
            "Audio track {} requested but {} only has {}",
            track_index,
            path.display(),
            tracks.len()
        )
    })?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let channels = codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut all_samples: Vec<f32> = Vec::new();
    if let Some(frames) = codec_params.n_frames {
        all_samples.reserve(frames as usize);
    }

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::debug!("Skipping undecodable packet: {}", err);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        downmix_into(&mut all_samples, sample_buf.samples(), channels);
    }

    log::info!(
        "Decoded audio track {}: {} samples, {}Hz, {} channel(s) -> mono, {:.1}s",
        track_index,
        all_samples.len(),
        sample_rate,
        channels,
        all_samples.len() as f32 / sample_rate as f32
    );

    Ok(Waveform::new(all_samples, sample_rate))
}

/// Average interleaved frames into mono samples.
fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
    } else {
        out.extend(
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }
}
