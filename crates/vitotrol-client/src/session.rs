//! Session and the underlying SOAP transport.
//!
//! Every request goes through [`Transport::send_request`]: one choke point
//! that builds the envelope, replays session cookies, swallows new cookies
//! and turns HTTP or applicative failures into errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::device::Device;
use crate::error::{Result, VitotrolError};
use crate::wire::{self, Envelope, ResultHeader, SoapBody};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP/SOAP transport shared by a session and its background poll tasks.
#[derive(Debug)]
pub(crate) struct Transport {
    client: Client,
    endpoint: Url,
    // Whole cookie lines, replayed verbatim on each request.
    cookies: Mutex<Vec<String>>,
    debug: AtomicBool,
}

impl Transport {
    fn new(endpoint: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        let endpoint = Url::parse(endpoint)?;

        Ok(Self {
            client,
            endpoint,
            cookies: Mutex::new(Vec::new()),
            debug: AtomicBool::new(false),
        })
    }

    pub(crate) fn clear_cookies(&self) {
        self.cookies.lock().clear();
    }

    /// Send one SOAP action and unwrap its result, failing on transport
    /// errors, non-200 statuses and non-zero result codes alike.
    pub(crate) async fn send_request<B: SoapBody>(
        &self,
        action: &str,
        body: &str,
    ) -> Result<B::Output> {
        let envelope = wire::request_envelope(body);

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("SOAPAction", wire::soap_action(action))
            .header(CONTENT_TYPE, "text/xml; charset=utf-8");
        for cookie in self.cookies.lock().iter() {
            request = request.header(COOKIE, cookie);
        }

        if self.debug.load(Ordering::Relaxed) {
            debug!("{action} request: {envelope}");
        }

        let response = request.body(envelope).send().await?;

        // The server re-issues the whole cookie set when it changes.
        let new_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        if !new_cookies.is_empty() {
            *self.cookies.lock() = new_cookies;
        }

        let status = response.status();
        if !status.is_success() {
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response.text().await.unwrap_or_default();
            return Err(VitotrolError::HttpStatus {
                status: status.as_u16(),
                body,
                headers,
            });
        }

        let text = response.text().await?;
        if self.debug.load(Ordering::Relaxed) {
            debug!("{action} response: {text}");
        }

        let envelope: Envelope<B> = quick_xml::de::from_str(&text)?;
        let result = envelope.body.into_result();
        if result.code() != 0 {
            return Err(VitotrolError::server(result.code(), result.message()));
        }
        Ok(result)
    }

    pub(crate) async fn request_write_status(&self, refresh_id: &str) -> Result<i32> {
        let result = self
            .send_request::<wire::RequestWriteStatusBody>(
                "RequestWriteStatus",
                &format!(
                    "<RequestWriteStatus><AktualisierungsId>{}</AktualisierungsId></RequestWriteStatus>",
                    wire::xml_escape(refresh_id)
                ),
            )
            .await?;
        Ok(result.status)
    }

    pub(crate) async fn request_refresh_status(&self, refresh_id: &str) -> Result<i32> {
        let result = self
            .send_request::<wire::RequestRefreshStatusBody>(
                "RequestRefreshStatus",
                &format!(
                    "<RequestRefreshStatus><AktualisierungsId>{}</AktualisierungsId></RequestRefreshStatus>",
                    wire::xml_escape(refresh_id)
                ),
            )
            .await?;
        Ok(result.status)
    }
}

/// An authenticated connection to the Vitodata server, caching the device
/// list. Entry point is [`Session::login`].
#[derive(Debug)]
pub struct Session {
    pub(crate) transport: Arc<Transport>,
    /// Devices discovered by [`Session::get_devices`].
    pub devices: Vec<Device>,
    /// Server technical version, set by [`Session::login`].
    pub tech_version: String,
}

impl Session {
    /// Session against the production Vitodata endpoint.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(wire::DEFAULT_ENDPOINT)
    }

    /// Session against a custom endpoint, e.g. a test server.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Session with custom HTTP timeouts.
    pub fn with_config(
        endpoint: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(Transport::new(endpoint, timeout, connect_timeout)?),
            devices: Vec::new(),
            tech_version: String::new(),
        })
    }

    /// When enabled, request and response bodies are traced at debug level.
    pub fn set_debug(&self, debug: bool) {
        self.transport.debug.store(debug, Ordering::Relaxed);
    }

    /// Authenticate against the server. Any previous session cookies are
    /// dropped first.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, login: &str, password: &str) -> Result<()> {
        let body = format!(
            "<Login>\n\
             <AppId>prod</AppId>\n\
             <AppVersion>4.3.1</AppVersion>\n\
             <Passwort>{}</Passwort>\n\
             <Betriebssystem>Android</Betriebssystem>\n\
             <Benutzer>{}</Benutzer>\n\
             </Login>",
            wire::xml_escape(password),
            wire::xml_escape(login)
        );

        self.transport.clear_cookies();

        let result = self
            .transport
            .send_request::<wire::LoginBody>("Login", &body)
            .await?;

        debug!(
            "logged in as {} {} (server {})",
            result.firstname, result.lastname, result.tech_version
        );
        self.tech_version = result.tech_version;
        Ok(())
    }

    /// Fetch the devices attached to the account, replacing the cached
    /// list. Devices are sorted by location then device ID.
    #[instrument(skip(self))]
    pub async fn get_devices(&mut self) -> Result<()> {
        let result = self
            .transport
            .send_request::<wire::GetDevicesBody>("GetDevices", "<GetDevices/>")
            .await?;

        let mut devices = Vec::new();
        for location in result.locations.locations {
            for device in location.devices.devices {
                devices.push(Device::new(
                    location.id,
                    location.name.clone(),
                    device.id,
                    device.name,
                    // An error anywhere is an error; connected only when
                    // the whole chain is.
                    location.has_error || device.has_error,
                    location.is_connected && device.is_connected,
                ));
            }
        }
        devices.sort_by_key(|d| (d.location_id, d.device_id));

        self.devices = devices;
        Ok(())
    }

    /// Status of a pending `WriteData`, by refresh ID.
    pub async fn request_write_status(&self, refresh_id: &str) -> Result<i32> {
        self.transport.request_write_status(refresh_id).await
    }

    /// Status of a pending `RefreshData`, by refresh ID.
    pub async fn request_refresh_status(&self, refresh_id: &str) -> Result<i32> {
        self.transport.request_refresh_status(refresh_id).await
    }
}
