//! Shared fixtures: an in-process stand-in for the pixiv hosts and sample
//! frame archives.

#![allow(dead_code)]

use std::{
    io::Cursor,
    net::TcpListener,
    path::Path,
    sync::{mpsc::Sender, Arc, Mutex, OnceLock},
    thread::JoinHandle,
};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rouille::{Request, Response};
use ugoira::{
    api::illust::FrameTimingMap,
    config::{ClientConfig, Endpoints},
    ugoira::archive::FrameBundle,
};

pub const ILLUST_ID: u64 = 53239740;
pub const ARCHIVE_PATH: &str =
    "/img-zip-ugoira/img/2015/10/27/22/10/14/53239740_ugoira600x600.zip";
pub const PAGE_PATH: &str = "/member_illust.php";
pub const LOGIN_PAGE_PATH: &str = "/login";
pub const LOGIN_API_PATH: &str = "/api/login";

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub cookie: Option<String>,
    pub referer: Option<String>,
    pub form: Vec<(String, String)>,
}

/// Records every request, then answers with `handler(request, base_url)`.
pub struct MockServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Request, &str) -> Response + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let base = Arc::new(OnceLock::<String>::new());

        let server = {
            let requests = Arc::clone(&requests);
            let base = Arc::clone(&base);
            rouille::Server::new("127.0.0.1:0", move |request| {
                let form = if request.method() == "POST" {
                    rouille::input::post::raw_urlencoded_post_input(request).unwrap_or_default()
                } else {
                    Vec::new()
                };
                requests.lock().unwrap().push(Recorded {
                    method: request.method().to_owned(),
                    path: request.url(),
                    cookie: request.header("Cookie").map(str::to_owned),
                    referer: request.header("Referer").map(str::to_owned),
                    form,
                });
                handler(request, base.get().map(String::as_str).unwrap_or_default())
            })
            .expect("mock server starts")
        };

        let url = format!("http://{}", server.server_addr());
        base.set(url.clone()).expect("base set once");
        let (handle, stop) = server.stoppable();

        Self {
            base: url,
            requests,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Endpoints with every host pointing at this server.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::with_hosts(&self.base, &self.base)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn agent() -> ureq::Agent {
    ClientConfig::default().build_agent()
}

/// Base url of a port nobody listens on.
pub fn dead_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn jpeg(color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)));
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Jpeg)
        .unwrap();
    data
}

/// Red, blue and green frames named like the ones pixiv serves.
pub fn sample_bundle() -> FrameBundle {
    let mut bundle = FrameBundle::default();
    bundle.push("000000.jpg", jpeg([255, 0, 0]));
    bundle.push("000001.jpg", jpeg([0, 0, 255]));
    bundle.push("000002.jpg", jpeg([0, 255, 0]));
    bundle
}

pub fn sample_archive() -> Vec<u8> {
    sample_bundle().to_zip().unwrap()
}

pub fn sample_timing() -> FrameTimingMap {
    [("000000.jpg", 1000), ("000001.jpg", 2000), ("000002.jpg", 3000)]
        .into_iter()
        .collect()
}

pub fn ugoira_page(archive_url: &str) -> String {
    let src = archive_url.replace('/', "\\/");
    format!(
        r#"<html><head><title>ugoira</title></head><body>
<script>pixiv.context.illustId = "53239740";
pixiv.context.ugokuIllustData = {{"src":"{}","mime_type":"image\/jpeg","frames":[{{"file":"000000.jpg","delay":1000}},{{"file":"000001.jpg","delay":2000}},{{"file":"000002.jpg","delay":3000}}]}};
</script></body></html>"#,
        src
    )
}

pub fn modern_ugoira_page() -> String {
    r#"<html><head><meta name="preload-data" id="meta-preload-data" content='{"illust":{"53239740":{"illustId":"53239740","illustType":2}}}'></head><body></body></html>"#.to_owned()
}

pub fn static_page() -> String {
    r#"<html><head><meta name="preload-data" id="meta-preload-data" content='{"illust":{"53231212":{"illustId":"53231212","illustType":0}}}'></head><body></body></html>"#.to_owned()
}

pub fn login_page() -> String {
    r#"<html><body><form action="/api/login" method="POST">
<input type="hidden" name="post_key" value="3c1f9e0a7b2d4e5f">
<input type="text" name="pixiv_id"><input type="password" name="password">
</form></body></html>"#
        .to_owned()
}

pub fn login_success() -> String {
    r#"{"error":false,"message":"","body":{"success":{"redirect_to":"http://www.pixiv.net/"}}}"#
        .to_owned()
}

/// Delays in centiseconds of every frame of the gif at `path`.
pub fn gif_delays(path: &Path) -> Vec<u16> {
    let file = std::fs::File::open(path).unwrap();
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(file).unwrap();
    let mut delays = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        delays.push(frame.delay);
    }
    delays
}

/// Serves the legacy page, the archive, and a HEAD check for it.
pub fn ugoira_host(archive: Vec<u8>) -> MockServer {
    MockServer::start(move |request, base| match (request.method(), request.url().as_str()) {
        ("GET", PAGE_PATH) => Response::html(ugoira_page(&format!("{}{}", base, ARCHIVE_PATH))),
        ("HEAD", ARCHIVE_PATH) => Response::text(""),
        ("GET", ARCHIVE_PATH) => Response::from_data("application/zip", archive.clone()),
        _ => Response::empty_404(),
    })
}
