//! Device capabilities consumed by the controllers
//!
//! The camera, the barcode decoder and the GPS are provided by the host
//! platform. This module only fixes the request/response contracts; the
//! headless implementations at the bottom serve command-line use and tests.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::Coordinates;

/// A runtime permission the app asks the user for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    Location,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Camera => f.write_str("camera"),
            Permission::Location => f.write_str("location"),
        }
    }
}

/// Answer to a permission query or request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Unknown,
    Denied,
    Restricted,
    Granted,
}

/// Platform permission prompts
#[async_trait]
pub trait Permissions: Send + Sync {
    /// Query the current status without prompting
    async fn check(&self, permission: Permission) -> PermissionStatus;

    /// Prompt the user once
    async fn request(&self, permission: Permission) -> PermissionStatus;
}

/// Barcode symbologies the decoder can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    MaxiCode,
    Pdf417,
    QrCode,
    Rss14,
    RssExpanded,
    UpcA,
    UpcE,
    UpcEanExtension,
}

impl BarcodeFormat {
    /// Every format the decoder understands
    pub const ALL: [BarcodeFormat; 17] = [
        BarcodeFormat::Aztec,
        BarcodeFormat::Codabar,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::Itf,
        BarcodeFormat::MaxiCode,
        BarcodeFormat::Pdf417,
        BarcodeFormat::QrCode,
        BarcodeFormat::Rss14,
        BarcodeFormat::RssExpanded,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::UpcEanExtension,
    ];
}

/// Decoder configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerOptions {
    pub formats: Vec<BarcodeFormat>,
    /// `false` is single-result detection
    pub multiple: bool,
    pub auto_rotate: bool,
    pub try_harder: bool,
    pub torch: bool,
}

impl ScannerOptions {
    /// All formats, one result, rotation and extra effort on
    pub fn single_result() -> Self {
        Self {
            formats: BarcodeFormat::ALL.to_vec(),
            multiple: false,
            auto_rotate: true,
            try_harder: true,
            torch: false,
        }
    }

    /// Turn the camera torch on or off
    pub fn with_torch(mut self, torch: bool) -> Self {
        self.torch = torch;
        self
    }
}

/// One decoded symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub format: BarcodeFormat,
    pub value: String,
}

/// Opens the camera with a live decoder attached
#[async_trait]
pub trait BarcodeScanner: Send + Sync {
    async fn open(&self, options: ScannerOptions) -> Result<Box<dyn Detector>>;
}

/// A live camera feed owned by exactly one page.
///
/// Implementations release the camera in `stop` and also when dropped.
#[async_trait]
pub trait Detector: Send {
    /// Next detection event, `None` once the feed has ended
    async fn next_detection(&mut self) -> Option<Vec<Detection>>;

    /// Stop detecting and release the camera
    async fn stop(&mut self);
}

/// Desired accuracy of a location fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Lowest,
    Low,
    Medium,
    High,
    Best,
}

/// Single-shot location request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub accuracy: Accuracy,
    pub timeout: Duration,
}

impl LocationRequest {
    pub fn high_accuracy(timeout: Duration) -> Self {
        Self {
            accuracy: Accuracy::High,
            timeout,
        }
    }
}

/// A location fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters
    pub accuracy: Option<f64>,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl From<Coordinates> for GeoFix {
    fn from(coordinates: Coordinates) -> Self {
        GeoFix::new(coordinates.latitude, coordinates.longitude)
    }
}

/// Platform GPS
///
/// `Ok(None)` means the platform answered without a fix. Failures are
/// [`Error::Unsupported`], [`Error::PermissionDenied`] or any other error.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self, request: &LocationRequest) -> Result<Option<GeoFix>>;
}

/// Ask `provider` for a fix, failing with [`Error::Timeout`] once
/// `request.timeout` has elapsed.
pub async fn locate(
    provider: &dyn LocationProvider,
    request: &LocationRequest,
) -> Result<Option<GeoFix>> {
    match tokio::time::timeout(request.timeout, provider.current_location(request)).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("location fix timed out after {:?}", request.timeout);
            Err(Error::Timeout(request.timeout))
        }
    }
}

/// Capabilities a page borrows from the device
#[derive(Clone)]
pub struct Devices {
    pub permissions: std::sync::Arc<dyn Permissions>,
    pub scanner: std::sync::Arc<dyn BarcodeScanner>,
    pub location: std::sync::Arc<dyn LocationProvider>,
}

impl fmt::Debug for Devices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Devices").finish_non_exhaustive()
    }
}

impl Devices {
    /// No camera and no GPS
    pub fn headless() -> Self {
        let unavailable = std::sync::Arc::new(Unavailable);
        Self {
            permissions: unavailable.clone(),
            scanner: unavailable.clone(),
            location: unavailable,
        }
    }

    /// No camera, a fixed position
    pub fn headless_at(fix: GeoFix) -> Self {
        Self {
            location: std::sync::Arc::new(FixedLocation(fix)),
            ..Self::headless()
        }
    }
}

/// A host without camera or GPS
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

#[async_trait]
impl Permissions for Unavailable {
    async fn check(&self, _permission: Permission) -> PermissionStatus {
        PermissionStatus::Restricted
    }

    async fn request(&self, _permission: Permission) -> PermissionStatus {
        PermissionStatus::Restricted
    }
}

#[async_trait]
impl BarcodeScanner for Unavailable {
    async fn open(&self, _options: ScannerOptions) -> Result<Box<dyn Detector>> {
        Err(Error::unsupported("no camera on this device"))
    }
}

#[async_trait]
impl LocationProvider for Unavailable {
    async fn current_location(&self, _request: &LocationRequest) -> Result<Option<GeoFix>> {
        Err(Error::unsupported("no GPS on this device"))
    }
}

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoFix);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self, _request: &LocationRequest) -> Result<Option<GeoFix>> {
        Ok(Some(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl LocationProvider for Stalled {
        async fn current_location(&self, _request: &LocationRequest) -> Result<Option<GeoFix>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn locate_times_out() {
        let request = LocationRequest::high_accuracy(Duration::from_secs(10));
        let result = locate(&Stalled, &request).await;
        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn locate_passes_fix_through() {
        let provider = FixedLocation(GeoFix::new(10.5, -3.25).with_accuracy(4.0));
        let request = LocationRequest::high_accuracy(Duration::from_secs(10));
        let fix = locate(&provider, &request).await.unwrap().unwrap();
        assert_eq!(fix.latitude, 10.5);
        assert_eq!(fix.accuracy, Some(4.0));
    }

    #[tokio::test]
    async fn headless_has_no_camera() {
        let devices = Devices::headless();
        assert_eq!(
            devices.permissions.check(Permission::Camera).await,
            PermissionStatus::Restricted
        );
        let opened = devices.scanner.open(ScannerOptions::single_result()).await;
        assert!(matches!(opened, Err(Error::Unsupported(_))));
    }

    #[test]
    fn single_result_options() {
        let options = ScannerOptions::single_result().with_torch(true);
        assert!(!options.multiple);
        assert!(options.torch);
        assert_eq!(options.formats.len(), BarcodeFormat::ALL.len());
    }
}
