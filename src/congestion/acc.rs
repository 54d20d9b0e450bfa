use crate::{error::Fatal, packet::PacketId, quantities::Float};

use super::{admitted, CongestionControl, ContactState, PacketInfo, ReceiverState};

/// Risk-aware admission.
///
/// A packet is admitted when the receiver's projected net growth over the
/// packet's remaining TTL still fits in its free space, or when the packet
/// would expire sooner than the packets the receiver has recently been
/// dropping. Every admission uses up one free slot.
#[derive(Debug, Default)]
pub struct Acc {
    state: ContactState,
}

fn projected_growth(rate: Float, info: &PacketInfo) -> Float {
    match info.remaining_ttl {
        Some(rttl) => rate * rttl.seconds(),
        None if rate > 0. => Float::INFINITY,
        None => 0.,
    }
}

impl CongestionControl for Acc {
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
        let Some(mut free) = contact.receiver.free() else {
            return Ok(admitted(contact.candidates));
        };
        let extras = contact.receiver.extras;
        let mut accepted = Vec::new();
        for id in contact.candidates {
            let info = contact.infos.get(&id).ok_or(Fatal::MissingPacketInfo(id))?;
            #[allow(clippy::cast_precision_loss)]
            let safe = projected_growth(extras.net_growth_rate, info) < free as Float;
            let doomed = matches!(
                (info.remaining_ttl, extras.mean_drop_rttl),
                (Some(rttl), Some(risk)) if rttl < risk
            );
            if safe || doomed {
                accepted.push(id);
                free = free.saturating_sub(1);
            }
        }
        Ok(admitted(accepted))
    }
}
