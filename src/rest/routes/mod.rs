pub mod health;
pub mod numa_topologies;
