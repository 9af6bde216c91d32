use std::collections::VecDeque;
use std::sync::Mutex;

use simplemux_frame::Frame;

/// Unbounded FIFO of frames awaiting a consumer.
///
/// Push and pop are O(1) and never block. The reader loop is the only
/// producer; the session owner is the only documented consumer. Pending
/// frames are released with the queue when the session is destroyed.
#[derive(Debug, Default)]
pub(crate) struct FrameQueue {
    inner: Mutex<VecDeque<Frame>>,
}

impl FrameQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the tail.
    pub(crate) fn push(&self, frame: Frame) {
        self.inner.lock().unwrap().push_back(frame);
    }

    /// Take the oldest frame, if any.
    pub(crate) fn pop(&self) -> Option<Frame> {
        self.inner.lock().unwrap().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use simplemux_frame::MuxHeader;

    use super::*;

    #[derive(Debug)]
    struct SeqHeader(u64);

    impl MuxHeader for SeqHeader {
        fn session_id(&self) -> u64 {
            self.0
        }

        fn body_len(&self) -> i64 {
            0
        }
    }

    fn frame(seq: u64) -> Frame {
        Frame::new(Box::new(SeqHeader(seq)), bytes::Bytes::new())
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let queue = FrameQueue::new();
        assert!(queue.pop().is_none());
    }

    #[test]
    fn fifo_order() {
        let queue = FrameQueue::new();
        for seq in 0..8 {
            queue.push(frame(seq));
        }
        for seq in 0..8 {
            let frame = queue.pop().expect("queue should hold a frame");
            assert_eq!(frame.session_id(), seq);
        }
        assert!(queue.pop().is_none());
    }

    #[test]
    fn concurrent_push_pop_preserves_order() {
        let queue = Arc::new(FrameQueue::new());
        const COUNT: u64 = 10_000;

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..COUNT {
                    queue.push(frame(seq));
                }
            })
        };

        let mut expected = 0;
        while expected < COUNT {
            if let Some(frame) = queue.pop() {
                assert_eq!(frame.session_id(), expected);
                expected += 1;
            } else {
                thread::yield_now();
            }
        }

        producer.join().expect("producer thread should finish");
        assert!(queue.pop().is_none());
    }
}
