use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    congestion::CongestionControlKind,
    dropping::DroppingPolicyKind,
    quantities::{seconds, Float, TimeSpan},
    scheduling::SchedulingPolicyKind,
    util::rand::ContinuousDistribution,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BufferConfig {
    /// Entries per node; zero means unbounded.
    pub capacity: usize,
    /// Zero means packets never expire.
    pub ttl: TimeSpan,
    /// Keep the insertion/drop/expiry history needed by [`CongestionControlKind::Acc`].
    pub recording: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    pub dropping: DroppingPolicyKind,
    pub scheduling: SchedulingPolicyKind,
    pub congestion: CongestionControlKind,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingRule {
    /// Hand over every packet the receiver lacks.
    Epidemic,
    /// Hand over a packet only to a node that meets its destination more often.
    Greedy,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProtocolConfig {
    pub forwarding: ForwardingRule,
    /// Time taken to move one packet across a contact.
    pub transmission_time: TimeSpan,
    /// How far back buffer history is read when describing a receiver.
    pub history_window: TimeSpan,
}

/// Distributions of the synthetic contact trace, in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TraceConfig {
    pub inter_contact: ContinuousDistribution<Float>,
    pub contact_duration: ContinuousDistribution<Float>,
    pub inter_generation: ContinuousDistribution<Float>,
    /// Zero disables checkpoints.
    pub checkpoint_interval: TimeSpan,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    pub duration: TimeSpan,
    pub nodes: usize,
    pub buffer: BufferConfig,
    pub policies: PolicyConfig,
    pub protocol: ProtocolConfig,
    pub trace: TraceConfig,
}

impl Default for SimulationConfig {
    fn default() -> SimulationConfig {
        SimulationConfig {
            seed: 0,
            duration: seconds(10_000.),
            nodes: 12,
            buffer: BufferConfig {
                capacity: 20,
                ttl: seconds(3_000.),
                recording: true,
            },
            policies: PolicyConfig {
                dropping: DroppingPolicyKind::DropFrontAsp,
                scheduling: SchedulingPolicyKind::GrtrSort,
                congestion: CongestionControlKind::Acc,
            },
            protocol: ProtocolConfig {
                forwarding: ForwardingRule::Greedy,
                transmission_time: seconds(1.),
                history_window: seconds(500.),
            },
            trace: TraceConfig {
                inter_contact: ContinuousDistribution::Exponential { mean: 20. },
                contact_duration: ContinuousDistribution::Uniform { min: 5., max: 30. },
                inter_generation: ContinuousDistribution::Exponential { mean: 25. },
                checkpoint_interval: seconds(1_000.),
            },
        }
    }
}

impl SimulationConfig {
    /// Rejects combinations that would abort a run part way through.
    pub fn validate(&self) -> Result<()> {
        if self.nodes < 2 {
            return Err(anyhow!("A simulation needs at least two nodes!"));
        }
        if self.protocol.transmission_time.is_negative() || self.protocol.transmission_time.is_zero() {
            return Err(anyhow!("Transmission time must be positive!"));
        }
        if self.policies.scheduling == SchedulingPolicyKind::Hnuv
            && self.protocol.forwarding == ForwardingRule::Epidemic
        {
            // Epidemic forwarding offers packets neither end has a utility for.
            return Err(anyhow!("HNUV scheduling requires greedy forwarding!"));
        }
        if self.policies.congestion == CongestionControlKind::Acc && !self.buffer.recording {
            return Err(anyhow!("ACC needs buffer recording enabled!"));
        }
        let trace = &self.trace;
        trace
            .inter_contact
            .validate()
            .with_context(|| "Invalid inter-contact distribution!")?;
        trace
            .contact_duration
            .validate()
            .with_context(|| "Invalid contact duration distribution!")?;
        trace
            .inter_generation
            .validate()
            .with_context(|| "Invalid inter-generation distribution!")?;
        Ok(())
    }
}
