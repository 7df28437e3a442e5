#![allow(dead_code)]

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};
use std::{collections::HashMap, env};
use tempfile::TempDir;

use xcloud_listener::codec::{encode_length, read_frame, Frame, OversizePolicy};

/// Cloneable in-memory sink, standing in for stdout.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    /// Decode every complete frame written so far.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        let mut cur = Cursor::new(self.bytes());
        let mut out = Vec::new();
        loop {
            match read_frame(&mut cur, usize::MAX, OversizePolicy::Skip).unwrap() {
                Frame::Payload(p) => out.push(p),
                Frame::Skipped { .. } => unreachable!("no size limit"),
                Frame::Eof => return out,
            }
        }
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink whose writes always fail, like a closed stdout pipe.
pub struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader that yields `prefix` and then fails, like stdin breaking mid-stream.
pub struct FailingReader {
    prefix: Cursor<Vec<u8>>,
}

impl FailingReader {
    pub fn after(prefix: Vec<u8>) -> Self {
        Self {
            prefix: Cursor::new(prefix),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.prefix.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::Other, "stdin failed")),
            n => Ok(n),
        }
    }
}

/// One input frame: native-endian length header claiming `declared` bytes, then `body`.
pub fn raw_frame(declared: u32, body: &[u8]) -> Vec<u8> {
    let mut out = encode_length(declared).to_vec();
    out.extend_from_slice(body);
    out
}

/// A well-formed input frame for `body`.
pub fn frame(body: &[u8]) -> Vec<u8> {
    raw_frame(body.len() as u32, body)
}

/// Env guard that restores previous env vars on drop.
pub struct EnvGuard {
    old: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, String)]) -> Self {
        let mut old = HashMap::new();
        for (k, v) in vars {
            old.insert((*k).to_string(), env::var(k).ok());
            env::set_var(k, v);
        }
        Self { old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, prev) in self.old.drain() {
            match prev {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

/// Create a temp sandbox and point HOME at it so user-scope installs land inside.
pub fn sandbox_env() -> (TempDir, EnvGuard) {
    let td = TempDir::new().expect("tempdir");
    let home = td.path().join("home");
    std::fs::create_dir_all(&home).unwrap();

    let guard = EnvGuard::set(&[("HOME", home.to_string_lossy().to_string())]);
    (td, guard)
}
