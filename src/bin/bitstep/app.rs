//! Audio device setup and the session that drives it.

use std::sync::Arc;

use bitstep::config::Library;
use bitstep::engine::{FrameClock, LiveChain};
use bitstep::profile::BitMode;
use bitstep::session::Session;
use bitstep::synth::ChainCommand;
use bitstep::{CHANNELS, MAX_BLOCK_SIZE};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info};

use super::ui::UiApp;

/// Commands buffered between the tick thread and the device callback.
/// Sized for several lookahead windows of full 8-voice chords.
const COMMAND_QUEUE: usize = 4096;
/// Mono samples buffered for the oscilloscope.
const SCOPE_QUEUE: usize = 8192;

pub type LiveSession = Session<FrameClock, Producer<ChainCommand>>;

/// The running output: keep alive for as long as sound should play.
pub struct AudioOutput {
    _stream: cpal::Stream,
    pub clock: FrameClock,
    pub sample_rate: f32,
}

fn open_output(
    commands: Consumer<ChainCommand>,
    mut scope: Producer<f32>,
) -> EyreResult<AudioOutput> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    info!(sample_rate, channels, "audio device opened");

    let mut live = LiveChain::new(sample_rate, BitMode::default(), commands);
    let clock = live.clock();
    let mut stereo = vec![0.0f32; MAX_BLOCK_SIZE * CHANNELS];

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            for out in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let frames = out.len() / channels;
                let block = &mut stereo[..frames * CHANNELS];
                live.render(block);

                for (frame, pair) in out.chunks_mut(channels).zip(block.chunks(CHANNELS)) {
                    let (left, right) = (pair[0], pair[1]);
                    match frame {
                        [mono] => *mono = 0.5 * (left + right),
                        [l, r, rest @ ..] => {
                            *l = left;
                            *r = right;
                            rest.fill(0.0);
                        }
                        [] => {}
                    }
                    // Scope drops samples when the UI falls behind.
                    let _ = scope.push(0.5 * (left + right));
                }
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;
    stream.play()?;

    Ok(AudioOutput {
        _stream: stream,
        clock,
        sample_rate,
    })
}

/// Open the device, build the session and hand both to the UI.
pub fn run(library: Library, style: Option<String>, seed: u64) -> EyreResult<()> {
    let (command_tx, command_rx) = RingBuffer::<ChainCommand>::new(COMMAND_QUEUE);
    let (scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_QUEUE);
    let output = open_output(command_rx, scope_tx)?;

    // Hold the chain silent until the first play.
    output.clock.suspend();
    let mut session: LiveSession =
        Session::new(library, Arc::new(output.clock.clone()), command_tx, seed);
    let style = style.unwrap_or_else(|| session.library().presets()[0].name.clone());
    session.generate(&style);

    let mut terminal = ratatui::init();
    let result = UiApp::new(session, output.clock.clone(), scope_rx, output.sample_rate, seed)
        .run(&mut terminal);
    ratatui::restore();
    result
}
