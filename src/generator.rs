use crate::proto::bid::{BidRequest, RequestAdSlot, VideoInfo};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

const MAX_SLOT_ID: i64 = 200;

/// Standard display dimensions sampled for generated slots.
const DIMENSIONS: &[(i32, i32)] = &[
    (468, 60),
    (728, 90),
    (300, 250),
    (250, 250),
    (336, 280),
    (160, 600),
    (120, 600),
    (200, 200),
];

const VIDEO_DIMENSIONS: &[(i32, i32)] = &[(640, 480), (480, 360)];

const PAGE_URLS: &[&str] = &[
    "http://www.video-sharing.test/watch?v=8123",
    "http://news.aggregator.test/front",
    "http://www.finance-portal.test/markets?tab=overview",
    "http://www.daily-paper.test/pages/technology/index.html",
    "http://weather.portal.test:8080/forecast",
];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
];

const MAX_VIDEO_DURATION_MS: i32 = 60_000;

/// Fabricates test bid requests. A configurable share are in-stream
/// video requests and a small share are pings.
pub struct RequestGenerator<R: Rng> {
    rng: R,
    video_proportion: f64,
    ping_proportion: f64,
}

impl<R: Rng> RequestGenerator<R> {
    pub fn new(rng: R, video_proportion: f64, ping_proportion: f64) -> Self {
        Self {
            rng,
            video_proportion,
            ping_proportion,
        }
    }

    pub fn next_request(&mut self) -> BidRequest {
        let draw: f64 = self.rng.gen();
        if draw < self.ping_proportion {
            self.ping_request()
        } else if draw < self.ping_proportion + self.video_proportion {
            self.video_request()
        } else {
            self.display_request()
        }
    }

    /// A liveness check: only the id and the ping flag are set.
    pub fn ping_request(&mut self) -> BidRequest {
        BidRequest {
            id: request_id(),
            is_ping: true,
            ..Default::default()
        }
    }

    fn display_request(&mut self) -> BidRequest {
        let (width, height) = *choose(&mut self.rng, DIMENSIONS);
        BidRequest {
            id: request_id(),
            is_ping: false,
            url: (*choose(&mut self.rng, PAGE_URLS)).to_string(),
            user_agent: (*choose(&mut self.rng, USER_AGENTS)).to_string(),
            adslot: vec![RequestAdSlot {
                id: self.rng.gen_range(1..=MAX_SLOT_ID),
                width: Some(width),
                height: Some(height),
            }],
            video: None,
        }
    }

    fn video_request(&mut self) -> BidRequest {
        let mut request = self.display_request();
        let (width, height) = *choose(&mut self.rng, VIDEO_DIMENSIONS);
        request.adslot = vec![RequestAdSlot {
            id: self.rng.gen_range(1..=MAX_SLOT_ID),
            width: Some(width),
            height: Some(height),
        }];
        let max = self.rng.gen_range(1..=MAX_VIDEO_DURATION_MS);
        request.video = Some(VideoInfo {
            min_ad_duration_ms: self.rng.gen_range(0..=max),
            max_ad_duration_ms: max,
        });
        request
    }
}

fn request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn choose<'a, R: Rng, T>(rng: &mut R, options: &'a [T]) -> &'a T {
    // The tables are compile-time non-empty.
    options.choose(rng).unwrap_or(&options[0])
}
