//! Message source feeding the dispatch conduit
//!
//! The source owns the only [`mpsc::Sender`] of the conduit. Returning from
//! [`produce`] drops it, which is the one and only close of the conduit on
//! every exit path.

use crate::models::Message;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Where messages come from
pub enum MessageInput {
    /// A finite list given up front (positional arguments)
    Presupplied(Vec<Message>),
    /// Successive lines of a text stream, until end-of-stream
    Lines(Box<dyn AsyncBufRead + Send + Unpin>),
}

impl MessageInput {
    /// Use the arguments when there are any, standard input otherwise
    pub fn from_args_or_stdin(args: Vec<String>) -> Self {
        if args.is_empty() {
            Self::from_reader(tokio::io::stdin())
        } else {
            Self::Presupplied(args.into_iter().map(Message::from).collect())
        }
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        Self::Lines(Box::new(BufReader::new(reader)))
    }
}

/// How the source stopped producing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProduceOutcome {
    /// Every message was published and the input ended
    Exhausted { published: usize },
    /// The stop signal fired before the input ended
    Stopped { published: usize },
    /// The dispatcher stopped receiving
    ConsumerGone { published: usize },
}

/// Publish every message of `input` into `destination`, then close it.
pub async fn produce(
    destination: mpsc::Sender<Message>,
    stop: CancellationToken,
    input: MessageInput,
) -> ProduceOutcome {
    let outcome = match input {
        MessageInput::Presupplied(messages) => publish_all(&destination, messages).await,
        MessageInput::Lines(reader) => publish_lines(&destination, &stop, reader).await,
    };

    tracing::debug!(?outcome, "Message source finished, closing conduit");
    outcome
}

async fn publish_all(
    destination: &mpsc::Sender<Message>,
    messages: Vec<Message>,
) -> ProduceOutcome {
    let mut published = 0;
    for message in messages {
        if destination.send(message).await.is_err() {
            return ProduceOutcome::ConsumerGone { published };
        }
        published += 1;
    }
    ProduceOutcome::Exhausted { published }
}

async fn publish_lines(
    destination: &mpsc::Sender<Message>,
    stop: &CancellationToken,
    mut reader: Box<dyn AsyncBufRead + Send + Unpin>,
) -> ProduceOutcome {
    let mut published = 0;
    let mut raw = Vec::new();

    loop {
        if stop.is_cancelled() {
            return ProduceOutcome::Stopped { published };
        }

        raw.clear();
        let next = tokio::select! {
            biased;
            _ = stop.cancelled() => return ProduceOutcome::Stopped { published },
            read = reader.read_until(b'\n', &mut raw) => read,
        };

        match next {
            Ok(0) => return ProduceOutcome::Exhausted { published },
            Ok(_) => {}
            Err(e) => {
                // A broken input stream ends production like end-of-stream
                tracing::warn!(error = %e, "Failed to read input line, treating as end of input");
                return ProduceOutcome::Exhausted { published };
            }
        }

        let line = decode_line(&raw);
        tokio::select! {
            biased;
            _ = stop.cancelled() => return ProduceOutcome::Stopped { published },
            sent = destination.send(Message::from(line)) => {
                if sent.is_err() {
                    return ProduceOutcome::ConsumerGone { published };
                }
            }
        }
        published += 1;
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode the rest.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the input.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    match std::str::from_utf8(line) {
        Ok(text) => text.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Input line is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(line).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    async fn drain(mut rx: mpsc::Receiver<Message>) -> Vec<String> {
        let mut received = Vec::new();
        while let Some(message) = rx.recv().await {
            received.push(message.into_body());
        }
        received
    }

    #[tokio::test]
    async fn test_presupplied_messages_published_in_order_then_closed() {
        let (tx, rx) = mpsc::channel(1);
        let collector = tokio::spawn(drain(rx));

        let input = MessageInput::from_args_or_stdin(vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
        ]);
        let outcome = produce(tx, CancellationToken::new(), input).await;

        assert_eq!(outcome, ProduceOutcome::Exhausted { published: 3 });
        // drain() only returns once the conduit is closed
        assert_eq!(collector.await.unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_lines_published_until_end_of_stream() {
        let (tx, rx) = mpsc::channel(1);
        let collector = tokio::spawn(drain(rx));

        let input = MessageInput::from_reader(&b"one\ntwo\n\nfour"[..]);
        let outcome = produce(tx, CancellationToken::new(), input).await;

        assert_eq!(outcome, ProduceOutcome::Exhausted { published: 4 });
        assert_eq!(collector.await.unwrap(), vec!["one", "two", "", "four"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_input() {
        let (tx, rx) = mpsc::channel(1);
        let collector = tokio::spawn(drain(rx));

        let input = MessageInput::from_reader(&b"first\ncaf\xe9\nthird\r\nfourth\n"[..]);
        let outcome = produce(tx, CancellationToken::new(), input).await;

        assert_eq!(outcome, ProduceOutcome::Exhausted { published: 4 });
        assert_eq!(
            collector.await.unwrap(),
            vec!["first", "caf\u{FFFD}", "third", "fourth"]
        );
    }

    #[test]
    fn test_decode_line_strips_terminators_only() {
        assert_eq!(decode_line(b"plain\n"), "plain");
        assert_eq!(decode_line(b"windows\r\n"), "windows");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\n"), "");
        assert_eq!(decode_line(b"inner\rcr\n"), "inner\rcr");
    }

    #[tokio::test]
    async fn test_stop_before_read_does_not_read() {
        let (tx, mut rx) = mpsc::channel(1);
        let stop = CancellationToken::new();
        stop.cancel();

        let input = MessageInput::from_reader(&b"never read\n"[..]);
        let outcome = produce(tx, stop, input).await;

        assert_eq!(outcome, ProduceOutcome::Stopped { published: 0 });
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_interrupts_blocked_read() {
        let (tx, rx) = mpsc::channel(1);
        let collector = tokio::spawn(drain(rx));
        let stop = CancellationToken::new();

        // The writer half stays open, so the reader blocks after the first line
        let (mut writer, reader) = tokio::io::duplex(64);
        writer.write_all(b"only line\n").await.unwrap();

        let producer = tokio::spawn(produce(
            tx,
            stop.clone(),
            MessageInput::from_reader(reader),
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("source should stop promptly")
            .unwrap();
        assert_eq!(outcome, ProduceOutcome::Stopped { published: 1 });
        assert_eq!(collector.await.unwrap(), vec!["only line"]);
        drop(writer);
    }

    #[tokio::test]
    async fn test_consumer_gone_ends_production() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let input = MessageInput::Presupplied(vec![Message::from("lost")]);
        let outcome = produce(tx, CancellationToken::new(), input).await;

        assert_eq!(outcome, ProduceOutcome::ConsumerGone { published: 0 });
    }
}
