/// Driver error draining for development builds
///
/// GPU errors are never checked in the draw hot path. Call `drain_errors`
/// at a convenient point (end of frame, after init) to flush and log them.

use crate::graphics_provider::GraphicsProvider;

/// Upper bound on errors drained in one call (some drivers never clear)
const MAX_DRAINED_ERRORS: usize = 64;

/// Pop every pending driver error and log it at ERROR severity
///
/// Returns the number of errors drained.
pub fn drain_errors(gfx: &mut dyn GraphicsProvider, source: &str) -> usize {
    let mut count = 0;
    while count < MAX_DRAINED_ERRORS {
        match gfx.next_error() {
            Some(code) => {
                crate::engine_error!(source, "GPU error 0x{:04X}", code);
                count += 1;
            }
            None => break,
        }
    }
    count
}
