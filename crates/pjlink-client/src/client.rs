//! PjLinkClient -- the PJLink monitoring and control engine.
//!
//! This module ties the command catalog ([`crate::commands`]) and
//! response parser ([`crate::protocol`]) to a [`Transport`] to produce a
//! working PJLink client. It layers, bottom to top:
//!
//! - the transport gate: one serialized byte exchange at a time, with an
//!   inter-command cooldown and bounded retry on socket failure;
//! - the session engine: banner detection and one-shot MD5
//!   authentication (see [`crate::session`]);
//! - the retry/scroll loop: blank reads past stale replies until the
//!   response tag matches the issued command;
//! - the poll engine and control dispatcher, which hold the session
//!   mutex for their whole cycle so a control can never interleave into
//!   the middle of a polling sequence.
//!
//! Two long-lived actors contend for the single session mutex: the
//! host-driven poll/control caller and the keep-alive supervisor
//! ([`crate::keepalive`]). Timestamps the supervisor reads without the
//! mutex live in [`Clocks`] as atomics.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use pjlink_core::error::{Error, Result};
use pjlink_core::metadata::{MetadataProvider, ADAPTER_BUILD_DATE_KEY, ADAPTER_VERSION_KEY};
use pjlink_core::transport::{LinkState, Transport};
use pjlink_core::types::{
    normalize_uptime, property, status, Control, ControlKind, DeviceClass, Snapshot,
};

use crate::commands::{self, Command};
use crate::inputs::InputCatalog;
use crate::keepalive::KeepAliveHandle;
use crate::protocol::{self, DeviceError, PjLinkResponse};
use crate::session::{auth_digest, with_digest, SessionState};

/// Socket-failure retries inside one exchange.
const EXCHANGE_RETRY_ATTEMPTS: u32 = 10;
/// Blank reads issued while scrolling past stale replies.
const SCROLL_ATTEMPTS: u32 = 10;
/// Pause between scroll reads.
const SCROLL_PAUSE: Duration = Duration::from_millis(200);
/// Polls within this window of a control replay the cached snapshot.
const CONTROL_COOLDOWN_MS: i64 = 5_000;
/// How long one poll keeps the session considered active.
const STATS_VALIDITY_MS: i64 = 3 * 60 * 1_000;

/// Resolved configuration for one client instance.
#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub password: Option<String>,
    /// Minimum gap between byte exchanges; the builder enforces the
    /// 200 ms floor.
    pub commands_cooldown: Duration,
    /// Idle period after which the supervisor refreshes the session;
    /// zero disables the supervisor.
    pub keep_alive: Duration,
    /// Input catalog refresh period.
    pub input_refresh: Duration,
}

/// Monotonic millisecond clocks shared between the engine and the
/// keep-alive supervisor.
///
/// All values are offsets from `epoch`. `last_control` uses `-1` for
/// "no control issued yet".
pub(crate) struct Clocks {
    epoch: Instant,
    last_command_ms: AtomicI64,
    last_control_ms: AtomicI64,
    valid_stats_deadline_ms: AtomicI64,
    paused: AtomicBool,
}

impl Clocks {
    pub(crate) fn new() -> Self {
        Clocks {
            epoch: Instant::now(),
            last_command_ms: AtomicI64::new(0),
            last_control_ms: AtomicI64::new(-1),
            valid_stats_deadline_ms: AtomicI64::new(0),
            // Paused until the first poll proves the host is active.
            paused: AtomicBool::new(true),
        }
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.epoch.elapsed().as_millis() as i64
    }

    pub(crate) fn mark_command(&self) {
        self.last_command_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    pub(crate) fn mark_control(&self) {
        self.last_control_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    pub(crate) fn ms_since_last_command(&self) -> i64 {
        self.now_ms() - self.last_command_ms.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last control, or `-1` if none was issued.
    pub(crate) fn ms_since_last_control(&self) -> i64 {
        let last = self.last_control_ms.load(Ordering::Relaxed);
        if last < 0 {
            return -1;
        }
        self.now_ms() - last
    }

    pub(crate) fn extend_stats_deadline(&self) {
        self.valid_stats_deadline_ms
            .store(self.now_ms() + STATS_VALIDITY_MS, Ordering::Relaxed);
    }

    pub(crate) fn stats_deadline_passed(&self) -> bool {
        self.valid_stats_deadline_ms.load(Ordering::Relaxed) < self.now_ms()
    }

    pub(crate) fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }
}

/// Engine state guarded by the single session mutex.
pub(crate) struct Engine {
    transport: Box<dyn Transport>,
    config: ClientConfig,
    clocks: Arc<Clocks>,
    metadata: Arc<dyn MetadataProvider>,
    session: SessionState,
    pending_nonce: Option<String>,
    device_class: Option<DeviceClass>,
    /// Command tags (and volume property names) the device answered with
    /// ERR1. Sticky for the life of the instance.
    unsupported: HashSet<String>,
    inputs: InputCatalog,
    inputs_refreshed_at: Option<Instant>,
    snapshot: Option<Snapshot>,
    volume_probe_done: bool,
}

impl Engine {
    // -------------------------------------------------------------------
    // Transport gate
    // -------------------------------------------------------------------

    /// One serialized byte exchange: cooldown, write, read one frame.
    ///
    /// Socket failures are retried up to [`EXCHANGE_RETRY_ATTEMPTS`]
    /// times with the same bytes, reopening the connection in between.
    /// On exhaustion the session is dropped and the last error surfaces.
    async fn exchange(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let cooldown = self.config.commands_cooldown.as_millis() as i64;
        let since = self.clocks.ms_since_last_command();
        if since < cooldown {
            tokio::time::sleep(Duration::from_millis((cooldown - since) as u64)).await;
        }
        self.clocks.mark_command();
        trace!(data = %String::from_utf8_lossy(data), "exchange");

        let mut last_err = match self.try_exchange(data).await {
            Ok(line) => return Ok(line),
            Err(e) if e.is_transient() => e,
            Err(e) => return Err(e),
        };

        for attempt in 1..=EXCHANGE_RETRY_ATTEMPTS {
            warn!(attempt, error = %last_err, "socket exchange failed, retrying with the same bytes");
            self.clocks.mark_command();
            let _ = self.transport.close().await;
            match self.transport.open().await {
                Ok(()) => match self.try_exchange(data).await {
                    Ok(line) => return Ok(line),
                    Err(e) if e.is_transient() => last_err = e,
                    Err(e) => return Err(e),
                },
                Err(e) if e.is_transient() => last_err = e,
                Err(e) => return Err(e),
            }
        }

        warn!("socket recovery attempts exhausted");
        self.drop_session().await;
        Err(last_err)
    }

    async fn try_exchange(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.transport.write(data).await?;
        self.transport.read_line().await
    }

    // -------------------------------------------------------------------
    // Session engine
    // -------------------------------------------------------------------

    /// Open the transport and read the greeting to establish the session
    /// branch: no-auth, authenticate-next-command, or rejected.
    async fn handshake(&mut self) -> Result<()> {
        if self.transport.state() != LinkState::Connected {
            self.transport.open().await?;
        }
        self.session = SessionState::BannerPending;

        let raw = self.exchange(&[]).await?;
        match protocol::parse(&raw) {
            PjLinkResponse::Banner(banner) if banner.requires_auth => {
                debug!("device requires authentication");
                self.pending_nonce = banner.nonce;
                self.session = SessionState::Authenticating;
            }
            PjLinkResponse::Banner(_) => {
                self.session = SessionState::Ready;
            }
            PjLinkResponse::Error(DeviceError::AuthFailed) => {
                self.drop_session().await;
                return Err(Error::AuthFailed);
            }
            // Some devices greet with an empty line; the session is usable.
            other => {
                trace!(?other, "no auth banner in greeting");
                self.session = SessionState::Ready;
            }
        }
        Ok(())
    }

    /// Close the transport and reset to `Disconnected`; the next command
    /// re-runs the handshake.
    pub(crate) async fn drop_session(&mut self) {
        let _ = self.transport.close().await;
        self.pending_nonce = None;
        self.session = SessionState::Disconnected;
    }

    /// Release the session because the host went idle.
    pub(crate) async fn pause_session(&mut self) {
        let _ = self.transport.close().await;
        self.pending_nonce = None;
        self.session = SessionState::Paused;
    }

    /// Send one command through the session engine and transport gate.
    ///
    /// Runs the handshake when no session is established, prepends the
    /// authentication digest to the first command of an authenticated
    /// session, and treats a banner arriving mid-session as a protocol
    /// fault that resets the connection.
    async fn send_command(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            // Blank reads pull the next queued reply; they never
            // re-handshake.
            return self.exchange(data).await;
        }

        if self.session.needs_handshake() || self.transport.state() != LinkState::Connected {
            self.handshake().await?;
        }

        let authenticating = self.session == SessionState::Authenticating;
        let wire = if authenticating {
            let nonce = self.pending_nonce.clone().unwrap_or_default();
            let password = self.config.password.clone().unwrap_or_default();
            debug!("prepending authentication digest");
            with_digest(&auth_digest(&nonce, &password), data)
        } else {
            data.to_vec()
        };

        let raw = self.exchange(&wire).await?;

        if authenticating {
            // The reply to the single authenticated command settles the
            // session.
            if matches!(
                protocol::parse(&raw),
                PjLinkResponse::Error(DeviceError::AuthFailed)
            ) {
                debug!("authentication rejected");
                self.drop_session().await;
                return Err(Error::AuthFailed);
            }
            self.pending_nonce = None;
            self.session = SessionState::Ready;
            return Ok(raw);
        }

        if raw.starts_with(protocol::BANNER_PREFIX.as_bytes()) {
            if matches!(
                protocol::parse(&raw),
                PjLinkResponse::Error(DeviceError::AuthFailed)
            ) {
                self.drop_session().await;
                return Err(Error::AuthFailed);
            }
            warn!("banner received mid-session, resetting connection");
            self.drop_session().await;
            return Err(Error::Transport("unexpected PJLINK banner mid-session".into()));
        }
        Ok(raw)
    }

    // -------------------------------------------------------------------
    // Retry/scroll loop
    // -------------------------------------------------------------------

    /// Send `data` and accept the reply once it is a device error or
    /// carries `tag`; otherwise scroll past stale replies with blank
    /// reads. Exhaustion yields the N/A sentinel.
    async fn send_with_scroll(&mut self, data: Vec<u8>, tag: &str) -> Result<PjLinkResponse> {
        let mut raw = self.send_command(&data).await?;
        if protocol::matches_expectation(&raw, tag) {
            return Ok(protocol::parse(&raw));
        }

        for attempt in 1..=SCROLL_ATTEMPTS {
            debug!(
                tag,
                attempt,
                received = %String::from_utf8_lossy(&raw),
                "reply does not match expected tag, scrolling"
            );
            tokio::time::sleep(SCROLL_PAUSE).await;
            raw = self.send_command(&[]).await?;
            if protocol::matches_expectation(&raw, tag) {
                return Ok(protocol::parse(&raw));
            }
        }
        Ok(PjLinkResponse::NotAvailable)
    }

    /// Issue one catalog query through the retry/scroll loop.
    pub(crate) async fn query(&mut self, cmd: &Command) -> Result<PjLinkResponse> {
        self.send_with_scroll(cmd.to_vec(), cmd.tag()).await
    }

    /// Query a status command for the poll engine.
    ///
    /// ERR1 records the tag as unsupported; other device errors are
    /// absorbed (the property is omitted from the snapshot), except
    /// ERR4 and ERRA which terminate the cycle.
    async fn status_value(&mut self, cmd: &Command) -> Result<Option<String>> {
        if self.unsupported.contains(cmd.tag()) {
            debug!(tag = cmd.tag(), "skipping command the device reported unsupported");
            return Ok(None);
        }
        match self.query(cmd).await? {
            PjLinkResponse::Value(v) if v.is_empty() => Ok(None),
            PjLinkResponse::Value(v) => Ok(Some(v)),
            PjLinkResponse::NotAvailable => Ok(Some(status::NOT_AVAILABLE.to_string())),
            PjLinkResponse::Error(DeviceError::Unsupported) => {
                warn!(tag = cmd.tag(), "undefined command, skipping from now on");
                self.unsupported.insert(cmd.tag().to_string());
                Ok(None)
            }
            PjLinkResponse::Error(DeviceError::AuthFailed) => Err(Error::AuthFailed),
            PjLinkResponse::Error(DeviceError::DeviceFailure) => {
                Err(Error::DeviceFailure(cmd.tag().to_string()))
            }
            PjLinkResponse::Error(e) => {
                warn!(tag = cmd.tag(), error = ?e, "device error during status refresh");
                Ok(None)
            }
            PjLinkResponse::Banner(_) => Ok(None),
        }
    }

    // -------------------------------------------------------------------
    // Poll engine
    // -------------------------------------------------------------------

    /// Assemble one snapshot of device state.
    pub(crate) async fn run_poll(&mut self) -> Result<Snapshot> {
        let mut snap = Snapshot::default();

        // Capability probe: the class decides the command set for the
        // rest of the cycle.
        match self.query(&commands::CLASS_QUERY).await? {
            PjLinkResponse::Value(v) => {
                if let Some(class) = DeviceClass::from_response(&v) {
                    self.device_class = Some(class);
                }
                if !v.is_empty() {
                    snap.properties.insert(property::PJLINK_CLASS.to_string(), v);
                }
            }
            PjLinkResponse::Error(DeviceError::AuthFailed) => return Err(Error::AuthFailed),
            other => debug!(?other, "unable to determine PJLink class"),
        }

        if self.device_class.is_some() {
            self.collect_class1(&mut snap).await?;
            debug!("finished collecting Class 1 statistics");
        }
        if self.device_class == Some(DeviceClass::Class2) {
            self.collect_class2(&mut snap).await?;
            debug!("finished collecting Class 2 statistics");
        }

        self.populate_metadata(&mut snap);

        if !self.config.keep_alive.is_zero() {
            self.clocks.extend_stats_deadline();
        }
        self.snapshot = Some(snap.clone());
        Ok(snap)
    }

    async fn collect_class1(&mut self, snap: &mut Snapshot) -> Result<()> {
        let avmt = self.status_value(&commands::MUTE_QUERY).await?;
        let erst = self.status_value(&commands::ERROR_STATUS_QUERY).await?;
        let lamp = self.status_value(&commands::LAMP_QUERY).await?;
        let name = self.status_value(&commands::NAME_QUERY).await?;
        let inf1 = self.status_value(&commands::INFO1_QUERY).await?;
        let inf2 = self.status_value(&commands::INFO2_QUERY).await?;
        let info = self.status_value(&commands::INFO_QUERY).await?;
        let power = self.status_value(&commands::POWER_QUERY).await?;

        let power_on = power.as_deref() == Some("1");
        if let Some(v) = &power {
            snap.properties.insert(property::POWER.to_string(), v.clone());
        }
        // The power switch is always offered.
        snap.controls
            .push(Control::switch(property::POWER, power.as_deref().unwrap_or("0")));

        if let Some(v) = avmt {
            populate_mute(snap, &v, power_on);
        }
        if let Some(v) = erst {
            populate_error_status(snap, &v);
        }
        if let Some(v) = lamp {
            populate_lamps(snap, &v);
        }
        if let Some(v) = name {
            snap.properties.insert(property::DEVICE_NAME.to_string(), v);
        }
        if let Some(v) = inf1 {
            snap.properties
                .insert(property::MANUFACTURER_DETAILS.to_string(), v);
        }
        if let Some(v) = inf2 {
            snap.properties
                .insert(property::PRODUCT_DETAILS.to_string(), v);
        }
        if let Some(v) = info {
            snap.properties
                .insert(property::DEVICE_DETAILS.to_string(), v);
        }
        Ok(())
    }

    async fn collect_class2(&mut self, snap: &mut Snapshot) -> Result<()> {
        let power_on = snap.get(property::POWER) == Some("1");

        if let Some(v) = self.status_value(&commands::SERIAL_NUMBER_QUERY).await? {
            snap.properties.insert(property::SERIAL_NUMBER.to_string(), v);
        }
        if let Some(v) = self.status_value(&commands::SOFTWARE_VERSION_QUERY).await? {
            snap.properties
                .insert(property::SOFTWARE_VERSION.to_string(), v);
        }
        if let Some(v) = self.status_value(&commands::FILTER_USAGE_QUERY).await? {
            snap.properties.insert(property::FILTER_USAGE.to_string(), v);
        }
        if let Some(v) = self.status_value(&commands::FILTER_MODEL_QUERY).await? {
            snap.properties
                .insert(property::FILTER_REPLACEMENT.to_string(), v);
        }
        if let Some(v) = self.status_value(&commands::LAMP_MODEL_QUERY).await? {
            snap.properties
                .insert(property::LAMP_REPLACEMENT.to_string(), v);
        }

        self.collect_input(snap, power_on).await?;
        self.collect_freeze(snap, power_on).await?;
        self.collect_volume_controls(snap).await?;

        if let Some(v) = self
            .status_value(&commands::RECOMMENDED_RESOLUTION_QUERY)
            .await?
        {
            snap.properties
                .insert(property::RECOMMENDED_RESOLUTION.to_string(), v);
        }
        if let Some(v) = self.status_value(&commands::INPUT_RESOLUTION_QUERY).await? {
            snap.properties
                .insert(property::INPUT_RESOLUTION.to_string(), v);
        }
        Ok(())
    }

    async fn collect_input(&mut self, snap: &mut Snapshot, power_on: bool) -> Result<()> {
        self.refresh_input_catalog().await?;

        if let Some(code) = self.status_value(&commands::INPUT_QUERY).await? {
            match self.inputs.name_for(&code) {
                Some(name) => {
                    let name = name.to_string();
                    snap.properties.insert(property::INPUT.to_string(), name.clone());
                    if power_on {
                        snap.controls.push(Control::dropdown(
                            property::INPUT,
                            self.inputs.names(),
                            &name,
                        ));
                    }
                }
                None => debug!(code = %code, "active input code missing from the catalog"),
            }
        }
        Ok(())
    }

    async fn collect_freeze(&mut self, snap: &mut Snapshot, power_on: bool) -> Result<()> {
        if let Some(v) = self.status_value(&commands::FREEZE_QUERY).await? {
            snap.properties.insert(property::FREEZE.to_string(), v.clone());
            if power_on {
                snap.controls.push(Control::switch(property::FREEZE, &v));
            }
        }
        Ok(())
    }

    /// Volume steps have no read query; on the first poll the dispatcher
    /// probes each channel with an up step immediately cancelled by a
    /// down step, and ERR1 on either marks the pair unsupported.
    async fn collect_volume_controls(&mut self, snap: &mut Snapshot) -> Result<()> {
        if !self.volume_probe_done {
            self.probe_volume_pair(
                &commands::SPEAKER_VOLUME_SET,
                property::SPEAKER_VOLUME_UP,
                property::SPEAKER_VOLUME_DOWN,
            )
            .await?;
            self.probe_volume_pair(
                &commands::MICROPHONE_VOLUME_SET,
                property::MICROPHONE_VOLUME_UP,
                property::MICROPHONE_VOLUME_DOWN,
            )
            .await?;
            self.volume_probe_done = true;
        }

        let buttons = [
            (property::MICROPHONE_VOLUME_UP, "+"),
            (property::MICROPHONE_VOLUME_DOWN, "-"),
            (property::SPEAKER_VOLUME_UP, "+"),
            (property::SPEAKER_VOLUME_DOWN, "-"),
        ];
        for (name, label) in buttons {
            if !self.unsupported.contains(name) {
                snap.properties.insert(name.to_string(), String::new());
                snap.controls.push(Control::button(name, label));
            }
        }
        Ok(())
    }

    async fn probe_volume_pair(&mut self, cmd: &Command, up: &str, down: &str) -> Result<()> {
        debug!(tag = cmd.tag(), "probing volume step support");
        let up_resp = self.send_with_scroll(cmd.patched(b"1"), cmd.tag()).await?;
        let down_resp = self.send_with_scroll(cmd.patched(b"0"), cmd.tag()).await?;

        for resp in [&up_resp, &down_resp] {
            match resp {
                PjLinkResponse::Error(DeviceError::AuthFailed) => return Err(Error::AuthFailed),
                PjLinkResponse::Error(DeviceError::Unsupported) => {
                    warn!(tag = cmd.tag(), "volume stepping unsupported");
                    self.unsupported.insert(up.to_string());
                    self.unsupported.insert(down.to_string());
                    return Ok(());
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn populate_metadata(&self, snap: &mut Snapshot) {
        if let Some(v) = self.metadata.get(ADAPTER_VERSION_KEY) {
            snap.properties.insert(property::ADAPTER_VERSION.to_string(), v);
        }
        if let Some(v) = self.metadata.get(ADAPTER_BUILD_DATE_KEY) {
            snap.properties
                .insert(property::ADAPTER_BUILD_DATE.to_string(), v);
        }
        let uptime = self.metadata.started_at().elapsed().as_secs();
        snap.properties
            .insert(property::ADAPTER_UPTIME.to_string(), normalize_uptime(uptime));
    }

    // -------------------------------------------------------------------
    // Input catalog
    // -------------------------------------------------------------------

    /// Rebuild the input catalog from INST + per-code INNM when the
    /// current catalog is empty or the refresh period elapsed. The map
    /// is fully rebuilt before the old one is replaced.
    async fn refresh_input_catalog(&mut self) -> Result<()> {
        let stale = match self.inputs_refreshed_at {
            None => true,
            Some(at) => at.elapsed() >= self.config.input_refresh,
        };
        if !self.inputs.is_empty() && !stale {
            debug!(inputs = self.inputs.len(), "input catalog refresh not due");
            return Ok(());
        }

        let list = match self.status_value(&commands::INPUT_LIST_QUERY).await? {
            Some(v) if v != status::NOT_AVAILABLE => v,
            _ => {
                debug!("INST provided no data, keeping previous input catalog");
                return Ok(());
            }
        };

        let mut fresh = InputCatalog::new();
        for code in list.split_whitespace() {
            if code.len() != 2 {
                debug!(code, "skipping malformed input code");
                continue;
            }
            let resp = self
                .send_with_scroll(commands::INPUT_NAME_QUERY.patched(code.as_bytes()), "INNM")
                .await?;
            match resp {
                PjLinkResponse::Value(name) if !name.is_empty() => fresh.insert(&name, code),
                other => debug!(code, ?other, "no display name for input code"),
            }
        }

        self.inputs = fresh;
        self.inputs_refreshed_at = Some(Instant::now());
        Ok(())
    }

    // -------------------------------------------------------------------
    // Control dispatcher
    // -------------------------------------------------------------------

    /// Map a (property, value) pair to a patched catalog command, send
    /// it, and fold the result back into the cached snapshot.
    pub(crate) async fn run_control(&mut self, name: &str, value: &str) -> Result<()> {
        debug!(name, value, "control request");
        self.clocks.mark_control();

        let (command, params): (&Command, Vec<u8>) = match name {
            property::POWER => (&commands::POWER_SET, vec![switch_byte(value)]),
            property::FREEZE => (&commands::FREEZE_SET, vec![switch_byte(value)]),
            property::VIDEO_MUTE => (&commands::VIDEO_MUTE_SET, vec![switch_byte(value)]),
            property::AUDIO_MUTE => (&commands::AUDIO_MUTE_SET, vec![switch_byte(value)]),
            property::INPUT => {
                let code = self.inputs.code_for(value).ok_or_else(|| {
                    Error::BadParameter(format!("no input code known for {value:?}"))
                })?;
                (&commands::INPUT_SET, code.as_bytes().to_vec())
            }
            property::SPEAKER_VOLUME_UP => (&commands::SPEAKER_VOLUME_SET, vec![b'1']),
            property::SPEAKER_VOLUME_DOWN => (&commands::SPEAKER_VOLUME_SET, vec![b'0']),
            property::MICROPHONE_VOLUME_UP => (&commands::MICROPHONE_VOLUME_SET, vec![b'1']),
            property::MICROPHONE_VOLUME_DOWN => (&commands::MICROPHONE_VOLUME_SET, vec![b'0']),
            other => {
                warn!(property = other, "ignoring control for unknown property");
                return Ok(());
            }
        };

        if self.unsupported.contains(command.tag()) || self.unsupported.contains(name) {
            return Err(Error::Unsupported(name.to_string()));
        }

        match self.send_with_scroll(command.patched(&params), command.tag()).await? {
            PjLinkResponse::Error(DeviceError::Unsupported) => {
                let key = if is_volume_property(name) {
                    name
                } else {
                    command.tag()
                };
                warn!(name, key, "device rejected control as unsupported");
                self.unsupported.insert(key.to_string());
                Err(Error::Unsupported(name.to_string()))
            }
            PjLinkResponse::Error(DeviceError::OutOfParameter) => {
                Err(Error::BadParameter(name.to_string()))
            }
            PjLinkResponse::Error(DeviceError::Unavailable) => {
                Err(Error::DeviceBusy(name.to_string()))
            }
            PjLinkResponse::Error(DeviceError::DeviceFailure) => {
                Err(Error::DeviceFailure(name.to_string()))
            }
            PjLinkResponse::Error(DeviceError::AuthFailed) => Err(Error::AuthFailed),
            _ => {
                self.apply_control_to_cache(name, value);
                Ok(())
            }
        }
    }

    /// Fold a successful control into the cached snapshot so cooldown
    /// replays reflect the change.
    fn apply_control_to_cache(&mut self, name: &str, value: &str) {
        if is_volume_property(name) {
            // Volume steps are stateless buttons.
            return;
        }
        let Some(snap) = self.snapshot.as_mut() else {
            return;
        };

        snap.properties.insert(name.to_string(), value.to_string());
        for control in snap.controls.iter_mut().filter(|c| c.name == name) {
            match &mut control.kind {
                ControlKind::Switch { on } => *on = value == "1",
                ControlKind::Dropdown { value: v, .. } => *v = value.to_string(),
                ControlKind::Button { .. } => {}
            }
        }

        if name == property::POWER && value == "0" {
            snap.controls.retain(|c| {
                c.name != property::INPUT
                    && c.name != property::AUDIO_MUTE
                    && c.name != property::VIDEO_MUTE
                    && c.name != property::FREEZE
            });
        }
    }
}

fn switch_byte(value: &str) -> u8 {
    if value == "1" {
        b'1'
    } else {
        b'0'
    }
}

fn is_volume_property(name: &str) -> bool {
    matches!(
        name,
        property::SPEAKER_VOLUME_UP
            | property::SPEAKER_VOLUME_DOWN
            | property::MICROPHONE_VOLUME_UP
            | property::MICROPHONE_VOLUME_DOWN
    )
}

/// Interpret an AVMT status word into the two mute properties.
///
/// ```text
/// 30  audio off, video off
/// 31  audio on,  video on
/// 21  audio on,  video off
/// 11  audio off, video on
/// ```
///
/// Any other value leaves both properties absent.
fn populate_mute(snap: &mut Snapshot, avmt: &str, power_on: bool) {
    let (audio, video) = match avmt {
        "30" => ("0", "0"),
        "31" => ("1", "1"),
        "21" => ("1", "0"),
        "11" => ("0", "1"),
        other => {
            debug!(avmt = other, "AVMT value not implemented");
            return;
        }
    };
    snap.properties
        .insert(property::AUDIO_MUTE.to_string(), audio.to_string());
    snap.properties
        .insert(property::VIDEO_MUTE.to_string(), video.to_string());
    if power_on {
        snap.controls.push(Control::switch(property::AUDIO_MUTE, audio));
        snap.controls.push(Control::switch(property::VIDEO_MUTE, video));
    }
}

/// Interpret the six-digit ERST word: Fan, Lamp, Temperature, CoverOpen,
/// Filter, Other. Shorter responses are discarded.
fn populate_error_status(snap: &mut Snapshot, erst: &str) {
    let digits: Vec<char> = erst.chars().collect();
    if digits.len() < 6 {
        return;
    }
    let keys = [
        property::ERROR_FAN,
        property::ERROR_LAMP,
        property::ERROR_TEMPERATURE,
        property::ERROR_COVER,
        property::ERROR_FILTER,
        property::ERROR_OTHER,
    ];
    for (key, digit) in keys.iter().zip(digits) {
        snap.properties
            .insert(key.to_string(), error_status_str(digit).to_string());
    }
}

fn error_status_str(digit: char) -> &'static str {
    match digit {
        '0' => status::OK,
        '1' => status::WARNING,
        '2' => status::ERROR,
        _ => status::NOT_AVAILABLE,
    }
}

/// Interpret a LAMP reply: space-separated (usage_hours, status_flag)
/// pairs, lamps numbered from 1.
fn populate_lamps(snap: &mut Snapshot, lamp: &str) {
    let mut index = 0;
    for (i, token) in lamp.split_whitespace().enumerate() {
        if i % 2 == 0 {
            index += 1;
            snap.properties
                .insert(property::lamp_usage_time(index), token.to_string());
        } else {
            let state = if token == "1" { status::ON } else { status::OFF };
            snap.properties
                .insert(property::lamp_status(index), state.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Client handle
// ---------------------------------------------------------------------------

/// A PJLink Class 1/2 client bound to one device.
///
/// Constructed via [`PjLinkBuilder`](crate::builder::PjLinkBuilder). All
/// device communication is serialized through one internal mutex;
/// [`poll`](PjLinkClient::poll) and [`control`](PjLinkClient::control)
/// hold it for their whole cycle.
pub struct PjLinkClient {
    engine: Arc<Mutex<Engine>>,
    clocks: Arc<Clocks>,
    keeper: Option<KeepAliveHandle>,
}

impl PjLinkClient {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        config: ClientConfig,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        let clocks = Arc::new(Clocks::new());
        let engine = Arc::new(Mutex::new(Engine {
            transport,
            config: config.clone(),
            clocks: clocks.clone(),
            metadata,
            session: SessionState::Disconnected,
            pending_nonce: None,
            device_class: None,
            unsupported: HashSet::new(),
            inputs: InputCatalog::new(),
            inputs_refreshed_at: None,
            snapshot: None,
            volume_probe_done: false,
        }));

        let keeper = if config.keep_alive.is_zero() {
            None
        } else {
            Some(crate::keepalive::spawn(
                engine.clone(),
                clocks.clone(),
                config.keep_alive,
            ))
        };

        PjLinkClient {
            engine,
            clocks,
            keeper,
        }
    }

    /// Run one monitoring cycle and return the resulting snapshot.
    ///
    /// Polls arriving within 5 s of a control replay the cached snapshot
    /// unchanged, giving the device time to settle.
    pub async fn poll(&self) -> Result<Snapshot> {
        let mut engine = self.engine.lock().await;

        let since_control = self.clocks.ms_since_last_control();
        if (0..CONTROL_COOLDOWN_MS).contains(&since_control) {
            if let Some(snapshot) = &engine.snapshot {
                debug!("control cooldown active, returning cached snapshot");
                return Ok(snapshot.clone());
            }
        }
        engine.run_poll().await
    }

    /// Apply one control action to the device.
    ///
    /// Unknown property names are a logged no-op.
    pub async fn control(&self, property: &str, value: &str) -> Result<()> {
        let mut engine = self.engine.lock().await;
        engine.run_control(property, value).await
    }

    /// The most recent successful snapshot, if any poll has completed.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.engine.lock().await.snapshot.clone()
    }

    /// Stop the keep-alive supervisor and close the device session.
    pub async fn shutdown(mut self) {
        if let Some(keeper) = self.keeper.take() {
            keeper.stop();
        }
        let mut engine = self.engine.lock().await;
        engine.drop_session().await;
    }
}

impl Drop for PjLinkClient {
    fn drop(&mut self) {
        if let Some(keeper) = &self.keeper {
            keeper.stop();
        }
    }
}
