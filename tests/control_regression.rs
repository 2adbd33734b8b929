//! End-to-end regression coverage of the control-object contracts:
//! broadcasting, envelope timing, portamento asymmetry, polyphonic
//! triggering, and click-free input switching.

use modsig::{
    control::{ControlNode, Fader, Follower, Metro, Port, RenderCtx},
    dsp::FaderStage,
    param::{Sig, SignalRef},
};

const SAMPLE_RATE: f32 = 1_000.0;
const BLOCK: usize = 100;

fn ctx() -> RenderCtx {
    RenderCtx::new(SAMPLE_RATE)
}

fn run(node: &mut dyn ControlNode, blocks: usize) {
    let ctx = ctx();
    for _ in 0..blocks {
        node.process_block(BLOCK, &ctx);
    }
}

/// Collect channel 0 across `blocks` blocks.
fn record(node: &mut dyn ControlNode, blocks: usize) -> Vec<f32> {
    let ctx = ctx();
    let mut out = Vec::with_capacity(blocks * BLOCK);
    for _ in 0..blocks {
        node.process_block(BLOCK, &ctx);
        out.extend_from_slice(node.channel(0));
    }
    out
}

#[test]
fn broadcast_takes_the_longest_list_and_wraps_the_rest() {
    let mut fader = Fader::with_times(vec![0.1, 0.2, 0.3], 0.05, 0.0).unwrap();
    assert_eq!(fader.channels(), 3);

    fader.play();
    run(&mut fader, 4); // 0.4s: all attacks done

    // The scalar fadeout broadcasts everywhere; the fadein list gives each
    // channel its own attack length, all of which end at 1.0.
    for ch in 0..3 {
        assert_eq!(*fader.channel(ch).last().unwrap(), 1.0);
    }
}

#[test]
fn fader_external_termination_waits_for_stop() {
    let mut fader = Fader::with_times(0.01, 0.1, 0.0).unwrap();
    fader.play();

    let held = record(&mut fader, 30); // 3 seconds
    assert!(held[10..].iter().all(|&s| s == 1.0), "sustain holds at 1.0 indefinitely");

    fader.stop();
    let released = record(&mut fader, 2);
    assert_eq!(*released.last().unwrap(), 0.0);
    assert_eq!(fader.stage(0), FaderStage::Done);
}

#[test]
fn fader_stop_during_attack_releases_from_partial_level() {
    let mut fader = Fader::with_times(1.0, 0.1, 0.0).unwrap();
    fader.play();
    run(&mut fader, 5); // 0.5s into a 1s attack

    let partial = *fader.channel(0).last().unwrap();
    assert!(partial < 0.75 && partial > 0.25);

    fader.stop();
    let released = record(&mut fader, 2);
    assert!(released.iter().all(|&s| s <= partial + 1e-6), "no overshoot past the partial level");
    assert_eq!(*released.last().unwrap(), 0.0);
}

#[test]
fn fader_fixed_duration_ignores_stop_and_self_terminates() {
    let mut timed = Fader::with_times(0.1, 0.1, 1.0).unwrap();
    let mut stopped = Fader::with_times(0.1, 0.1, 1.0).unwrap();
    timed.play();
    stopped.play();

    run(&mut timed, 5);
    run(&mut stopped, 5);
    stopped.stop(); // must not change anything

    let a = record(&mut timed, 6);
    let b = record(&mut stopped, 6);
    assert_eq!(a, b, "stop() must not alter a timed envelope");

    // Release began at t=0.9: by 1.0s the envelope is back at 0.
    assert_eq!(*a.last().unwrap(), 0.0);
    assert_eq!(timed.stage(0), FaderStage::Done);
}

#[test]
fn port_rises_faster_than_it_falls() {
    let sig = Sig::new(0.0);
    let input = SignalRef::new(sig.clone());
    let mut port = Port::with_times(input, 0.1, 0.5).unwrap();
    run(&mut port, 2);

    // Upward step: 63% point after ~0.1s.
    sig.set_value(1.0);
    let up = record(&mut port, 1);
    assert!((up[99] - 0.632).abs() < 0.02, "rise 63% at ~0.1s, got {}", up[99]);

    run(&mut port, 40); // settle at 1.0

    // Downward step: after 0.5s, 63% of the fall is done.
    sig.set_value(0.0);
    let down = record(&mut port, 5);
    assert!((down[499] - 0.368).abs() < 0.02, "fall 63% at ~0.5s, got {}", down[499]);
}

#[test]
fn metro_poly_streams_average_one_pulse_per_time() {
    let mut metro = Metro::with_time(1.0, 4).unwrap();
    assert_eq!(metro.channels(), 4);

    let ctx = ctx();
    let mut pulses: Vec<(usize, usize)> = Vec::new();
    for block in 0..45 {
        metro.process_block(BLOCK, &ctx);
        for ch in 0..metro.channels() {
            for (k, &s) in metro.channel(ch).iter().enumerate() {
                if s == 1.0 {
                    pulses.push((block * BLOCK + k, ch));
                }
            }
        }
    }
    pulses.sort_unstable();

    // One pulse per second on average, rotating across the four streams.
    assert_eq!(pulses.len(), 4);
    for window in pulses.windows(2) {
        let spacing = window[1].0 - window[0].0;
        assert!((spacing as i64 - 1_000).abs() <= 2, "spacing {spacing}");
        assert_ne!(window[0].1, window[1].1, "consecutive triggers rotate streams");
    }
}

#[test]
fn follower_tracks_amplitude_of_a_bipolar_signal() {
    struct Square {
        magnitude: f32,
        n: usize,
    }
    impl modsig::param::SignalSource for Square {
        fn process_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
            for sample in out.iter_mut() {
                *sample = if (self.n / 10) % 2 == 0 {
                    self.magnitude
                } else {
                    -self.magnitude
                };
                self.n += 1;
            }
        }
    }

    let input = SignalRef::new(Square {
        magnitude: 0.5,
        n: 0,
    });
    let mut follower = Follower::new(input).unwrap();
    let out = record(&mut follower, 50);
    let settled = *out.last().unwrap();
    assert!((settled - 0.5).abs() < 0.01, "expected ~0.5, got {settled}");
}

#[test]
fn input_swap_chain_never_exceeds_the_blend_slew() {
    let a = SignalRef::new(Sig::new(0.0));
    let b = SignalRef::new(Sig::new(1.0));
    let c = SignalRef::new(Sig::new(-1.0));

    let mut port = Port::with_times(a, 0.001, 0.001).unwrap();
    run(&mut port, 2);

    // First swap, then a second one landing mid-fade.
    port.set_input(b, 0.2).unwrap();
    run(&mut port, 1); // 0.1s: halfway through
    port.set_input(c, 0.2).unwrap();

    let out = record(&mut port, 4);
    let max_slew = 2.0 / (0.2 * SAMPLE_RATE) + 0.01;
    let mut previous = out[0];
    for &s in &out[1..] {
        assert!(
            (s - previous).abs() <= max_slew,
            "jump {} exceeds the blend slew bound",
            (s - previous).abs()
        );
        previous = s;
    }
    assert!(*out.last().unwrap() < -0.97, "chain settles on the final target");
}

#[test]
fn idempotent_setters_leave_output_bit_identical() {
    let sig_a = Sig::new(0.3);
    let sig_b = Sig::new(0.3);
    let mut reference = Port::with_times(SignalRef::new(sig_a), 0.05, 0.2).unwrap();
    let mut touched = Port::with_times(SignalRef::new(sig_b), 0.05, 0.2).unwrap();

    run(&mut reference, 2);
    run(&mut touched, 2);

    touched.set_risetime(0.05).unwrap();
    touched.set_falltime(0.2).unwrap();

    let a = record(&mut reference, 3);
    let b = record(&mut touched, 3);
    assert_eq!(a, b);
}

#[test]
fn control_outputs_are_not_routable() {
    let input = SignalRef::new(Sig::new(0.0));
    let mut nodes: Vec<Box<dyn ControlNode>> = vec![
        Box::new(Fader::new()),
        Box::new(Metro::new()),
        Box::new(Port::new(input.clone()).unwrap()),
        Box::new(Follower::new(input).unwrap()),
    ];

    for node in &mut nodes {
        assert!(!node.caps().routable);
        node.out(0); // guaranteed no-op
        node.process_block(BLOCK, &ctx());
    }
}
