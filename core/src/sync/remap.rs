//! Channel layout normalization

/// Rewrite interleaved `input` with `in_channels` per frame into `output`
/// with `out_channels` per frame.
///
/// - Equal counts copy verbatim.
/// - Extra input channels are cut off (not a downmix).
/// - Missing output channels repeat the last input channel.
///
/// At most `frames` frames are processed, fewer if either buffer is shorter.
/// With zero input channels there is nothing to repeat, so output is silent.
pub fn remap_channels(
    input: &[f32],
    in_channels: usize,
    output: &mut [f32],
    out_channels: usize,
    frames: usize,
) {
    if out_channels == 0 {
        return;
    }

    if in_channels == 0 {
        let len = (frames * out_channels).min(output.len());
        output[..len].fill(0.0);
        return;
    }

    if in_channels == out_channels {
        let len = (frames * in_channels).min(input.len()).min(output.len());
        output[..len].copy_from_slice(&input[..len]);
        return;
    }

    let frames_in = input.chunks_exact(in_channels);
    let frames_out = output.chunks_exact_mut(out_channels);

    if in_channels > out_channels {
        for (src, dst) in frames_in.zip(frames_out).take(frames) {
            dst.copy_from_slice(&src[..out_channels]);
        }
    } else {
        for (src, dst) in frames_in.zip(frames_out).take(frames) {
            let (head, tail) = dst.split_at_mut(in_channels);
            head.copy_from_slice(src);
            tail.fill(src[in_channels - 1]);
        }
    }
}
