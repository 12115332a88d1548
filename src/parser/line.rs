//! Incremental `\r\n` line scanner (C4), the sub-state-machine the request
//! parser drives to pull one line at a time out of the read buffer.

/// Result of scanning for the next line starting at a caller-tracked cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineResult {
    /// A complete line was found; the payload is `buf[start..end]` for the
    /// `end` carried here, using whatever `start` the caller tracked.
    Ok(usize),
    /// The buffer is exhausted mid-line; the caller must read more before
    /// scanning again. Resuming is safe and idempotent: the cursor only
    /// ever advances over bytes already known not to begin a terminator.
    Open,
    /// A `\r` not followed by `\n`, or a `\n` not preceded by `\r`.
    Bad,
}

/// Scans `buf[*checked_idx..read_idx]` for the next `\r\n`.
///
/// On [`LineResult::Ok`], both bytes of the terminator are overwritten with
/// NUL and `*checked_idx` advances past them, so repeated calls can share a
/// buffer with in-place null-terminated lines. A lone `\r` at the end of the
/// filled region leaves `*checked_idx` pointing at the `\r` itself, so the
/// next call re-examines it once its successor byte arrives.
pub fn scan_line(buf: &mut [u8], checked_idx: &mut usize, read_idx: usize) -> LineResult {
    let mut i = *checked_idx;
    while i < read_idx {
        match buf[i] {
            b'\r' => {
                if i + 1 >= read_idx {
                    *checked_idx = i;
                    return LineResult::Open;
                }
                if buf[i + 1] != b'\n' {
                    return LineResult::Bad;
                }
                let end = i;
                buf[i] = 0;
                buf[i + 1] = 0;
                *checked_idx = i + 2;
                return LineResult::Ok(end);
            }
            b'\n' => return LineResult::Bad,
            _ => i += 1,
        }
    }
    *checked_idx = i;
    LineResult::Open
}
