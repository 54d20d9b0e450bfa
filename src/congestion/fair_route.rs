use crate::{error::Fatal, packet::PacketId};

use super::{admitted, CongestionControl, ContactState, PacketInfo, ReceiverState};

/// Reciprocity-based admission.
///
/// The receiver takes packets while its queue is no longer than the
/// sender's. Past that point a packet only goes through if the receiver
/// has a positive utility for its destination and the sender has none.
#[derive(Debug, Default)]
pub struct FairRoute {
    state: ContactState,
}

impl CongestionControl for FairRoute {
    fn record_receiver_state(&mut self, state: ReceiverState) {
        self.state.record(state);
    }

    fn add_packet_info(&mut self, info: PacketInfo) {
        self.state.add(info);
    }

    fn filter_packets(&mut self, candidates: &[PacketId]) -> Result<Option<Vec<PacketId>>, Fatal> {
        let Some(contact) = self.state.begin_filter(candidates)? else {
            return Ok(None);
        };
        let sender_length = contact.receiver.extras.sender_length;
        let mut receiver_length = contact.receiver.length;
        let mut accepted = Vec::new();
        for id in contact.candidates {
            let reciprocal = receiver_length <= sender_length;
            let better_carrier = contact
                .infos
                .get(&id)
                .is_some_and(|info| info.receiver_utility > 0. && info.sender_utility <= 0.);
            if reciprocal || better_carrier {
                accepted.push(id);
                receiver_length += 1;
            }
        }
        Ok(admitted(accepted))
    }
}
