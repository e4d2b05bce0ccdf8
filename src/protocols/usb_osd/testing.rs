// SPDX-License-Identifier: GPL-3.0-only
//! In-memory stand-in for the USB billboard bridge

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::ControlChannel;

const KNOWN_CODES: [&[u8]; 3] = [&[0xE0, 0x69], &[0x10], &[0x62]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Out {
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: Vec<u8>,
    },
    In {
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    },
}

/// Records every transfer and answers "get" frames from its own register map
#[derive(Debug, Default)]
pub struct FakeBridge {
    pub transfers: Vec<Transfer>,
    /// Feature code -> current value, updated by "set" frames
    pub registers: HashMap<Vec<u8>, u8>,
    /// Replies returned instead of the register-derived one
    pub scripted: VecDeque<Vec<u8>>,
    /// Report this many bytes written instead of the full frame
    pub short_write: Option<usize>,
    pub fail_next_out: Option<rusb::Error>,
    pub fail_next_in: Option<rusb::Error>,
    pending_get: Option<Vec<u8>>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, code: &[u8], value: u8) -> Self {
        self.registers.insert(code.to_vec(), value);
        self
    }

    pub fn script_reply(&mut self, reply: Vec<u8>) {
        self.scripted.push_back(reply);
    }

    /// Every frame written, in order
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.transfers
            .iter()
            .filter_map(|t| match t {
                Transfer::Out { data, .. } => Some(data.clone()),
                Transfer::In { .. } => None,
            })
            .collect()
    }

    /// Payloads of "set" frames only (feature code and value bytes)
    pub fn set_payloads(&self) -> Vec<Vec<u8>> {
        self.frames()
            .into_iter()
            .filter(|f| f.get(3) == Some(&0x03))
            .map(|f| f[4..].to_vec())
            .collect()
    }

    fn apply_frame(&mut self, frame: &[u8]) {
        if frame.len() < 4 {
            return;
        }
        let payload = &frame[4..];
        match frame[3] {
            0x01 => self.pending_get = Some(payload.to_vec()),
            0x03 => {
                // Values are the trailing byte, anything between is padding
                if let Some((value, rest)) = payload.split_last() {
                    let code = KNOWN_CODES
                        .iter()
                        .find(|k| rest.starts_with(k))
                        .map(|k| k.to_vec())
                        .unwrap_or_else(|| rest.to_vec());
                    self.registers.insert(code, *value);
                }
            }
            _ => {}
        }
    }
}

impl ControlChannel for FakeBridge {
    fn control_out(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        _timeout: Duration,
    ) -> rusb::Result<usize> {
        self.transfers.push(Transfer::Out {
            request_type,
            request,
            value,
            index,
            data: data.to_vec(),
        });
        if let Some(err) = self.fail_next_out.take() {
            return Err(err);
        }
        self.apply_frame(data);
        Ok(self.short_write.unwrap_or(data.len()))
    }

    fn control_in(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> rusb::Result<usize> {
        self.transfers.push(Transfer::In {
            request_type,
            request,
            value,
            index,
            length: buf.len(),
        });
        if let Some(err) = self.fail_next_in.take() {
            return Err(err);
        }

        let reply = match self.scripted.pop_front() {
            Some(reply) => reply,
            None => {
                let mut reply = vec![0u8; 12];
                let code = self.pending_get.take().unwrap_or_default();
                reply[10] = self.registers.get(&code).copied().unwrap_or(0);
                reply
            }
        };

        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        Ok(n)
    }
}
