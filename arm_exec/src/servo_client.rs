//! # Servo client
//!
//! Sends servo demands to the arm's servo controller. The controller is driven over a serial line
//! with one text frame per update (see [`ServoDems::to_frame`]), so the client is a frame writer
//! over anything implementing [`std::io::Write`].
//!
//! A serial line can take longer to write a frame than a loop cycle lasts, so the loop never calls
//! the transport itself. It posts each set of demands to a [`ServoSender`], whose background thread
//! writes the newest demands posted and drops any that were replaced before it got to them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use comms_if::eqpt::servo::ServoDems;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something the control loop can send servo demands to.
pub trait ServoTransport: Send {
    /// Send one set of demands.
    fn send(&mut self, dems: &ServoDems) -> Result<(), ServoClientError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Writes demands as newline terminated frames.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    writer: W,
    num_sent: u64,
}

/// Hands servo demands to a background thread which owns the transport.
///
/// Only the latest demands are kept: posting while the transport is still busy replaces the
/// demands waiting to be sent. Dropping the sender writes any waiting demands, then stops the
/// thread.
pub struct ServoSender {
    mailbox: Arc<Mailbox>,
    bg_jh: Option<JoinHandle<()>>,
}

/// Demands waiting for the background thread.
#[derive(Debug, Default)]
struct Mailbox {
    slot: Mutex<Slot>,
    posted: Condvar,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<ServoDems>,
    closed: bool,
    num_replaced: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ServoClientError {
    #[error("Could not open the servo device {0}: {1}")]
    DeviceOpenError(String, std::io::Error),

    #[error("Could not write the frame to the servo device: {0}")]
    WriteError(std::io::Error),

    #[error("Could not start the servo sender thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            num_sent: 0,
        }
    }

    /// Number of frames written so far.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }

    /// Consume the client, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl FrameWriter<File> {
    /// Open a device node or file for writing frames into.
    ///
    /// Existing files are appended to, so a serial port configured beforehand keeps its settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ServoClientError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path.as_ref())
            .map_err(|e| {
                ServoClientError::DeviceOpenError(path.as_ref().to_string_lossy().to_string(), e)
            })?;

        Ok(Self::new(file))
    }
}

impl<W: Write + Send> ServoTransport for FrameWriter<W> {
    fn send(&mut self, dems: &ServoDems) -> Result<(), ServoClientError> {
        writeln!(self.writer, "{}", dems.to_frame()).map_err(ServoClientError::WriteError)?;
        self.writer.flush().map_err(ServoClientError::WriteError)?;

        self.num_sent += 1;

        Ok(())
    }
}

impl<T: ServoTransport + ?Sized> ServoTransport for Box<T> {
    fn send(&mut self, dems: &ServoDems) -> Result<(), ServoClientError> {
        (**self).send(dems)
    }
}

impl ServoSender {
    /// Start the background thread sending demands through `transport`.
    pub fn spawn(mut transport: Box<dyn ServoTransport>) -> Result<Self, ServoClientError> {
        let mailbox = Arc::new(Mailbox::default());
        let bg_mailbox = mailbox.clone();

        let bg_jh = thread::Builder::new()
            .name("servo_sender".into())
            .spawn(move || bg_thread(&mut transport, &bg_mailbox))
            .map_err(ServoClientError::SpawnError)?;

        Ok(Self {
            mailbox,
            bg_jh: Some(bg_jh),
        })
    }

    /// Queue demands for sending, replacing any still waiting. Never waits on the transport.
    ///
    /// Returns true if unsent demands were replaced.
    pub fn post(&self, dems: &ServoDems) -> bool {
        let mut slot = self.mailbox.lock();

        let replaced = slot.pending.replace(*dems).is_some();
        if replaced {
            slot.num_replaced += 1;
        }

        self.mailbox.posted.notify_one();

        replaced
    }

    /// Number of demands replaced before the transport could send them.
    pub fn num_replaced(&self) -> u64 {
        self.mailbox.lock().num_replaced
    }
}

impl Drop for ServoSender {
    fn drop(&mut self) {
        self.mailbox.lock().closed = true;
        self.mailbox.posted.notify_one();

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                warn!("Servo sender thread panicked");
            }
        }
    }
}

impl Mailbox {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, sends the latest posted demands until the sender is dropped.
fn bg_thread(transport: &mut Box<dyn ServoTransport>, mailbox: &Mailbox) {
    loop {
        let dems = {
            let mut slot = mailbox.lock();

            loop {
                if let Some(d) = slot.pending.take() {
                    break d;
                }
                if slot.closed {
                    return;
                }
                slot = mailbox
                    .posted
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        // Transport errors never stop the arm
        if let Err(e) = transport.send(&dems) {
            warn!("Could not send servo demands: {}", e);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{io::Read, time::{Duration, Instant}};

    /// Transport which takes a while to send each frame.
    struct SlowTransport {
        delay: Duration,
        sent: Arc<Mutex<Vec<ServoDems>>>,
    }

    impl ServoTransport for SlowTransport {
        fn send(&mut self, dems: &ServoDems) -> Result<(), ServoClientError> {
            thread::sleep(self.delay);
            self.sent.lock().unwrap().push(*dems);
            Ok(())
        }
    }

    #[test]
    fn test_frames_are_lines() {
        let mut client = FrameWriter::new(Vec::new());

        client
            .send(&ServoDems::new([90.0, 90.0, 145.0, 45.0, 107.0, 65.0]))
            .unwrap();
        client
            .send(&ServoDems::new([0.0, 12.4, 12.6, 180.0, 90.0, 30.0]))
            .unwrap();

        assert_eq!(client.num_sent(), 2);
        assert_eq!(
            String::from_utf8(client.into_inner()).unwrap(),
            "_0,90;_1,90;_2,145;_3,45;_4,107;_5,65;\n_0,0;_1,12;_2,13;_3,180;_4,90;_5,30;\n"
        );
    }

    #[test]
    fn test_open_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servo_frames.txt");

        for _ in 0..2 {
            let mut client: Box<dyn ServoTransport> = Box::new(FrameWriter::open(&path).unwrap());
            client.send(&ServoDems::new([90.0; 6])).unwrap();
        }

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_post_does_not_wait_for_transport() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sender = ServoSender::spawn(Box::new(SlowTransport {
            delay: Duration::from_millis(200),
            sent: sent.clone(),
        }))
        .unwrap();

        let start = Instant::now();
        for i in 0..5 {
            sender.post(&ServoDems::new([i as f64; 6]));
        }
        assert!(start.elapsed() < Duration::from_millis(100));

        // Waiting demands are written out before the thread stops
        drop(sender);

        let sent = sent.lock().unwrap();
        assert!(!sent.is_empty() && sent.len() < 5);
        assert_eq!(sent.last(), Some(&ServoDems::new([4.0; 6])));
    }

    #[test]
    fn test_latest_demands_win() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sender = ServoSender::spawn(Box::new(SlowTransport {
            delay: Duration::from_millis(100),
            sent: sent.clone(),
        }))
        .unwrap();

        // Let the thread pick up the first demands, then post two while it is busy
        sender.post(&ServoDems::new([1.0; 6]));
        thread::sleep(Duration::from_millis(30));
        assert!(!sender.post(&ServoDems::new([2.0; 6])));
        assert!(sender.post(&ServoDems::new([3.0; 6])));
        assert_eq!(sender.num_replaced(), 1);

        drop(sender);

        assert_eq!(
            *sent.lock().unwrap(),
            vec![ServoDems::new([1.0; 6]), ServoDems::new([3.0; 6])]
        );
    }

    #[test]
    fn test_open_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            FrameWriter::open(dir.path().join("no_such_dir/tty")),
            Err(ServoClientError::DeviceOpenError(_, _))
        ));
    }
}
