// SPDX-License-Identifier: MIT OR Apache-2.0

//! # omni-core
//!
//! The control-plane core for managing fleets of [Talos Linux](https://www.talos.dev/)
//! Kubernetes clusters: a resource-graph reconciliation runtime, a staged
//! CA-rotation sequencer, and a join/admission pipeline. The gRPC/HTTP
//! transports, CLI, frontend, and Talos/Kubernetes API clients themselves
//! are external collaborators this crate hands typed contracts to.
//!
//! ## Module Overview
//!
//! - [`model`] — The typed resource data model (clusters, machines, secrets, …)
//! - [`store`] — The in-memory resource store and watch machinery
//! - [`controller`] — The `Controller` trait and reconcile-outcome contract
//! - [`transform`] — Label-derived child-resource controllers
//! - [`sequence`] — The generic phase-sequence controller
//! - [`rotation`] — Staged CA-rotation orchestration
//! - [`power`] — Power-stage derivation for bare machines
//! - [`configstatus`] — Config application, reset backoff, staged upgrades
//! - [`admission`] — Join-token validation and the SideroLink provision pipeline
//! - [`trustd`] — Virtual trustd CA-selection policy
//! - [`config`] — Ambient crate configuration and talosctl config-file parsing
//! - [`error`] — Error types
//! - [`client`], [`resources`], [`runtime`], [`api`], [`testkit`] — the
//!   underlying Talos gRPC client this core's config-application and
//!   candidate-validation paths drive
//!
//! ## Disclaimer
//!
//! This project is **NOT** affiliated with Sidero Labs or Talos Linux.
//! Provided AS-IS, without warranty of any kind.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod admission;
pub mod api;
pub mod client;
pub mod config;
pub mod configstatus;
pub mod controller;
pub mod error;
pub mod model;
pub mod power;
pub mod resources;
pub mod rotation;
pub mod runtime;
pub mod sequence;
pub mod store;
pub mod testkit;
pub mod transform;
pub mod trustd;

pub use admission::{AdmissionService, JoinToken, ProvisionRequest, ProvisionResponse};
pub use client::{
    ConnectionPool, ConnectionPoolConfig, EndpointHealth, HealthStatus, LoadBalancer, NodeTarget,
    TalosClient, TalosClientConfig, TalosClientConfigBuilder, NODE_METADATA_KEY,
};
pub use config::{
    CoreConfig, CoreConfigBuilder, JoinTokensMode, TalosConfig, TalosContext, ENV_TALOSCONFIG,
    ENV_TALOS_CONTEXT, ENV_TALOS_ENDPOINTS, ENV_TALOS_NODES,
};
pub use controller::{Controller, ReconcileOutcome};
pub use error::{CoreError, CoreResult, TalosError};
pub use rotation::RotationController;
pub use trustd::{CsrSigner, TrustdService};
pub use resources::{
    ApplyConfigurationRequest, ApplyConfigurationResponse, ApplyConfigurationResult, ApplyMode,
    BootstrapRequest, BootstrapResponse, BootstrapResult, ConnectionRecord, ConnectionState,
    ContainerDriver, CopyRequest, CopyResponse, CpuInfo, CpuInfoResponse, CpuInfoResult, DiskStat,
    DiskStatsResponse, DiskStatsResult, DiskUsageInfo, DiskUsageRequest, DiskUsageResponse,
    DmesgRequest, DmesgResponse, EtcdAlarmDisarmResponse, EtcdAlarmListResponse, EtcdAlarmType,
    EtcdDefragmentResponse, EtcdForfeitLeadershipRequest, EtcdForfeitLeadershipResponse,
    EtcdLeaveClusterRequest, EtcdLeaveClusterResponse, EtcdMember, EtcdMemberAlarm,
    EtcdMemberListRequest, EtcdMemberListResponse, EtcdMemberStatus, EtcdRemoveMemberByIdRequest,
    EtcdRemoveMemberByIdResponse, EtcdStatusResponse, FileInfo, FileType,
    GenerateClientConfigurationRequest, GenerateClientConfigurationResponse,
    GenerateClientConfigurationResult, KubeconfigResponse, L4ProtoFilter, ListRequest,
    ListResponse, LoadAvgResponse, LoadAvgResult, LogsRequest, LogsResponse, MemoryResponse,
    MemoryResult, MountStat, MountsResponse, MountsResult, NetDevStat, NetstatFilter,
    NetstatRequest, NetstatResponse, NetstatResult, NetworkDeviceStatsResponse,
    NetworkDeviceStatsResult, PacketCaptureRequest, PacketCaptureResponse, ProcessInfo,
    ProcessesResponse, ProcessesResult, ReadRequest, ReadResponse, ResetPartitionSpec,
    ResetRequest, ResetResponse, ResetResult, RollbackResponse, RollbackResult,
    ServiceRestartRequest, ServiceRestartResponse, ServiceStartRequest, ServiceStartResponse,
    ServiceStopRequest, ServiceStopResponse, UpgradeRebootMode, UpgradeRequest, UpgradeResponse,
    UpgradeResult, WipeMode,
};
pub use runtime::{
    BackoffStrategy, CircuitBreaker, CircuitBreakerConfig, CircuitState, CustomRetryPolicy,
    DefaultRetryPolicy, ExponentialBackoff, FixedBackoff, InterceptorMetrics, LinearBackoff,
    LogLevel, LoggingConfig, LoggingInterceptor, NoBackoff, NoRetryPolicy, RequestLogger,
    RequestSpan, RetryConfig, RetryConfigBuilder, RetryPolicy,
};
