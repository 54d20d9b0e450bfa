use crate::{error::Fatal, packet::PacketId};

use super::{admitted, CongestionControl, ContactState, PacketInfo, ReceiverState};

/// Admits every scheduled packet.
#[derive(Debug, Default)]
pub struct AdmitAll {
    state: ContactState,
}

impl CongestionControl for AdmitAll {
    fn record_receiver_state(&mut self, state: ReceiverState) {
        self.state.record(state);
    }

    fn add_packet_info(&mut self, info: PacketInfo) {
        self.state.add(info);
    }

    fn filter_packets(&mut self, candidates: &[PacketId]) -> Result<Option<Vec<PacketId>>, Fatal> {
        Ok(self
            .state
            .begin_filter(candidates)?
            .and_then(|contact| admitted(contact.candidates)))
    }
}

/// Never sends more packets than the receiver has free slots.
///
/// Candidates are cut from the front of the list until the rest fits.
#[derive(Debug, Default)]
pub struct AvoidOverflow {
    state: ContactState,
}

impl CongestionControl for AvoidOverflow {
    fn record_receiver_state(&mut self, state: ReceiverState) {
        self.state.record(state);
    }

    fn add_packet_info(&mut self, info: PacketInfo) {
        self.state.add(info);
    }

    fn filter_packets(&mut self, candidates: &[PacketId]) -> Result<Option<Vec<PacketId>>, Fatal> {
        let Some(mut contact) = self.state.begin_filter(candidates)? else {
            return Ok(None);
        };
        if let Some(free) = contact.receiver.free() {
            let excess = contact.candidates.len().saturating_sub(free);
            contact.candidates.drain(..excess);
        }
        Ok(admitted(contact.candidates))
    }
}
