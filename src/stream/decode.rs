//! Frame decoding combinator for listeners on the shared medium

use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tracing::{debug, warn};

use crate::protocol::NodeReport;

/// Extension trait turning a stream of received frames into node reports.
pub trait DecodeFramesExt<B, E>: Stream<Item = Result<B, E>> {
    /// Decode every frame, skipping receive errors and malformed frames.
    ///
    /// Both kinds of failure are logged; neither ends the stream.
    fn decode_frames(self) -> DecodeFrames<Self>
    where
        Self: Sized,
    {
        DecodeFrames::new(self)
    }
}

impl<S, B, E> DecodeFramesExt<B, E> for S where S: Stream<Item = Result<B, E>> {}

pin_project! {
    /// Stream of [`NodeReport`]s decoded from received frames.
    pub struct DecodeFrames<S> {
        #[pin]
        frames: S,
        skipped: u64,
    }
}

impl<S> DecodeFrames<S> {
    pub fn new(frames: S) -> Self {
        Self { frames, skipped: 0 }
    }

    /// Frames dropped so far because they could not be received or decoded.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<S, B, E> Stream for DecodeFrames<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = NodeReport;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match ready!(this.frames.as_mut().poll_next(cx)) {
                Some(Ok(frame)) => match NodeReport::decode(frame.as_ref()) {
                    Ok(report) => return Poll::Ready(Some(report)),
                    Err(e) => {
                        debug!("Skipping undecodable frame: {}", e);
                        *this.skipped += 1;
                    }
                },
                Some(Err(e)) => {
                    warn!("Frame receive error: {}", e);
                    *this.skipped += 1;
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;
    use crate::test_utils::node_a_snapshot;
    use crate::types::Event;
    use futures::StreamExt;

    #[tokio::test]
    async fn skips_failures_and_keeps_going() {
        let good = encode_frame(Event::ParentAdded, &node_a_snapshot()).unwrap();
        let frames: Vec<Result<Vec<u8>, String>> = vec![
            Err("lagged by 3".to_string()),
            Ok(vec![0x00, 0x00, 0x02, 0x05, 0x01]),
            Ok(good.as_bytes().to_vec()),
        ];

        let mut reports = futures::stream::iter(frames).decode_frames();
        let report = reports.next().await.unwrap();
        assert_eq!(report.id.as_deref(), Some("NodeA"));
        assert!(report.new_route.is_some());
        assert_eq!(reports.skipped(), 2);
        assert!(reports.next().await.is_none());
    }
}
