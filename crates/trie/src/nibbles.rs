//! Nibble-path utilities and Yellow Paper hex-prefix encoding (Appendix C).

/// Unpacks a byte slice into its constituent nibbles, high nibble first.
pub fn unpack(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(b >> 4);
        out.push(b & 0x0f);
    }
    out
}

/// Returns the number of nibbles in `a` and `b` that agree, starting from the front.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Hex-prefix encodes a nibble path (Yellow Paper Appendix C), folding in a flag that
/// distinguishes leaf paths (`terminating = true`) from extension paths.
pub fn hex_prefix_encode(nibbles: &[u8], terminating: bool) -> Vec<u8> {
    let odd = nibbles.len() % 2 == 1;
    let mut flag = if terminating { 2u8 } else { 0u8 };
    if odd {
        flag += 1;
    }

    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);
    let mut rest = nibbles;
    if odd {
        out.push((flag << 4) | nibbles[0]);
        rest = &nibbles[1..];
    } else {
        out.push(flag << 4);
    }
    for pair in rest.chunks_exact(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    out
}

/// Decodes a hex-prefix encoded path back into its nibbles and `terminating` flag.
pub fn hex_prefix_decode(bytes: &[u8]) -> (Vec<u8>, bool) {
    let first = bytes.first().copied().unwrap_or(0);
    let flag = first >> 4;
    let terminating = flag >= 2;
    let odd = flag & 1 == 1;

    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    if odd {
        nibbles.push(first & 0x0f);
    }
    for b in &bytes[1..] {
        nibbles.push(b >> 4);
        nibbles.push(b & 0x0f);
    }
    (nibbles, terminating)
}
