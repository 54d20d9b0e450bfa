use itertools::Either;

use crate::{
    error::Fatal,
    quantities::{Time, TimeSpan},
};

use super::{NativeFields, PacketId};

/// Two native packets stored as a single network-coded payload.
///
/// `mimic` holds the index of the surviving constituent once the other one
/// has been deleted or has expired; the entry then answers every query as
/// if it held only the survivor.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedEntry {
    parts: [NativeFields; 2],
    mimic: Option<usize>,
}

impl EncodedEntry {
    pub fn new(first: NativeFields, second: NativeFields) -> Result<EncodedEntry, Fatal> {
        if !first.encodable_with(&second) {
            return Err(Fatal::InvalidEncoding(first.id, second.id));
        }
        Ok(EncodedEntry {
            parts: [first, second],
            mimic: None,
        })
    }

    #[must_use]
    pub const fn parts(&self) -> &[NativeFields; 2] {
        &self.parts
    }

    #[must_use]
    pub const fn mimic(&self) -> Option<usize> {
        self.mimic
    }

    #[must_use]
    pub const fn ids(&self) -> [PacketId; 2] {
        [self.parts[0].id, self.parts[1].id]
    }

    #[must_use]
    pub fn combines(&self, a: PacketId, b: PacketId) -> bool {
        let [x, y] = self.ids();
        (x == a && y == b) || (x == b && y == a)
    }

    fn index_of(&self, id: PacketId) -> Option<usize> {
        self.parts.iter().position(|p| p.id == id)
    }

    /// Index of `id` if it is still logically present.
    #[must_use]
    pub fn live_index(&self, id: PacketId) -> Option<usize> {
        let index = self.index_of(id)?;
        match self.mimic {
            None => Some(index),
            Some(survivor) => (survivor == index).then_some(index),
        }
    }

    /// The deleted constituent, kept only as side information.
    #[must_use]
    pub fn extra(&self) -> Option<PacketId> {
        self.mimic.map(|survivor| self.parts[1 - survivor].id)
    }

    /// The other constituent while both are logically present.
    #[must_use]
    pub fn partner(&self, id: PacketId) -> Option<PacketId> {
        match (self.mimic, self.index_of(id)) {
            (None, Some(index)) => Some(self.parts[1 - index].id),
            _ => None,
        }
    }

    pub fn live_parts(&self) -> impl Iterator<Item = &NativeFields> {
        let mimic = self.mimic;
        self.parts
            .iter()
            .enumerate()
            .filter(move |(i, _)| mimic.map_or(true, |survivor| survivor == *i))
            .map(|(_, p)| p)
    }
}

/// Outcome of checking an entry against the buffer lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Alive,
    /// One constituent of a coded entry expired; the other survives.
    Partial(PacketId),
    /// The whole entry is gone, listing the packets that were still live.
    Dead(Vec<PacketId>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PacketEntry {
    Native(NativeFields),
    Encoded(EncodedEntry),
}

impl PacketEntry {
    #[must_use]
    pub const fn is_encoded(&self) -> bool {
        matches!(self, PacketEntry::Encoded(_))
    }

    pub fn live_parts(&self) -> impl Iterator<Item = &NativeFields> {
        match self {
            PacketEntry::Native(fields) => Either::Left(std::iter::once(fields)),
            PacketEntry::Encoded(encoded) => Either::Right(encoded.live_parts()),
        }
    }

    pub fn live_ids(&self) -> impl Iterator<Item = PacketId> + '_ {
        self.live_parts().map(|p| p.id)
    }

    #[must_use]
    pub fn live(&self, id: PacketId) -> Option<&NativeFields> {
        match self {
            PacketEntry::Native(fields) => (fields.id == id).then_some(fields),
            PacketEntry::Encoded(encoded) => encoded.live_index(id).map(|i| &encoded.parts[i]),
        }
    }

    pub fn live_mut(&mut self, id: PacketId) -> Option<&mut NativeFields> {
        match self {
            PacketEntry::Native(fields) => (fields.id == id).then_some(fields),
            PacketEntry::Encoded(encoded) => {
                let index = encoded.live_index(id)?;
                Some(&mut encoded.parts[index])
            }
        }
    }

    /// Earliest creation time among the live constituents.
    #[must_use]
    pub fn created(&self) -> Time {
        self.live_parts()
            .map(|p| p.created)
            .min()
            .unwrap_or(Time::MIN)
    }

    /// An entry counts as relayed when none of its live packets originated here.
    #[must_use]
    pub fn is_relayed(&self) -> bool {
        self.live_parts().all(NativeFields::is_relayed)
    }

    pub(super) fn expire(&mut self, now: Time, ttl: TimeSpan) -> Expiry {
        match self {
            PacketEntry::Native(fields) => {
                if fields.is_expired(now, ttl) {
                    Expiry::Dead(vec![fields.id])
                } else {
                    Expiry::Alive
                }
            }
            PacketEntry::Encoded(encoded) => {
                let expired = [
                    encoded.parts[0].is_expired(now, ttl),
                    encoded.parts[1].is_expired(now, ttl),
                ];
                match encoded.mimic {
                    Some(survivor) if expired[survivor] => {
                        Expiry::Dead(vec![encoded.parts[survivor].id])
                    }
                    Some(_) => Expiry::Alive,
                    None => match expired {
                        [false, false] => Expiry::Alive,
                        [true, true] => Expiry::Dead(encoded.ids().to_vec()),
                        [first, _] => {
                            let gone = usize::from(!first);
                            encoded.mimic = Some(1 - gone);
                            Expiry::Partial(encoded.parts[gone].id)
                        }
                    },
                }
            }
        }
    }

    /// Deletes one live constituent of a coded entry, keeping the other.
    pub(super) fn mimic_other(&mut self, id: PacketId) -> bool {
        match self {
            PacketEntry::Encoded(encoded) if encoded.mimic.is_none() => {
                match encoded.index_of(id) {
                    Some(index) => {
                        encoded.mimic = Some(1 - index);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }
}
