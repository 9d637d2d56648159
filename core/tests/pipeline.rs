use blinkmorse_core::{
    patterns, BlinkEvent, Classifier, DecodeEvent, DecodeStatus, EyeContour, EyeLandmarks,
    ModelBundle, Point, Session, SessionConfig, Symbol,
};

const FRAME: f64 = 1.0 / 30.0;

/// Eye whose aspect ratio equals `ratio`
fn eye(cx: f64, ratio: f64) -> EyeContour {
    let half_w = 15.0;
    let half_h = 15.0 * ratio;
    [
        Point::new(cx - half_w, 60.0),
        Point::new(cx - 5.0, 60.0 - half_h),
        Point::new(cx + 5.0, 60.0 - half_h),
        Point::new(cx + half_w, 60.0),
        Point::new(cx + 5.0, 60.0 + half_h),
        Point::new(cx - 5.0, 60.0 + half_h),
    ]
}

fn face(ratio: f64) -> EyeLandmarks {
    EyeLandmarks::new(eye(100.0, ratio), eye(170.0, ratio))
}

/// Drives a session with a synthetic 30 fps camera
struct Camera {
    session: Session,
    frame: u64,
    events: Vec<DecodeEvent>,
}

impl Camera {
    fn new(session: Session) -> Self {
        Self {
            session,
            frame: 0,
            events: Vec::new(),
        }
    }

    fn now(&self) -> f64 {
        self.frame as f64 * FRAME
    }

    fn hold(&mut self, ratio: Option<f64>, seconds: f64) {
        let frames = (seconds / FRAME).round() as u64;
        for _ in 0..frames {
            let landmarks = ratio.map(face);
            let now = self.now();
            self.events.extend(self.session.ingest(landmarks.as_ref(), now));
            self.frame += 1;
        }
    }

    fn open(&mut self, seconds: f64) {
        self.hold(Some(0.32), seconds);
    }

    fn blink(&mut self, seconds: f64) {
        self.hold(Some(0.06), seconds);
    }

    /// Key a letter with dots of 0.2s and dashes of 0.8s, 0.5s apart
    fn key(&mut self, pattern: &str) {
        for symbol in patterns::parse_pattern(pattern) {
            match symbol {
                Symbol::Dot => self.blink(0.2),
                Symbol::Dash => self.blink(0.8),
            }
            self.open(0.5);
        }
    }

    fn decoded(&self) -> Vec<char> {
        self.events.iter().filter_map(|e| e.char).collect()
    }

    fn count(&self, status: DecodeStatus) -> usize {
        self.events.iter().filter(|e| e.status == status).count()
    }
}

#[test]
fn test_letter_then_one_space() {
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    camera.key("--..");
    assert_eq!(camera.session.sequence(), "--..");

    camera.open(2.5);
    assert_eq!(camera.decoded(), vec!['Z']);
    assert_eq!(camera.session.message(), "Z");

    camera.open(5.0);
    assert_eq!(camera.session.message(), "Z ");
    assert_eq!(camera.count(DecodeStatus::SpaceAdded), 1);

    camera.open(10.0);
    assert_eq!(camera.session.message(), "Z ");
    assert_eq!(camera.count(DecodeStatus::SpaceAdded), 1);
}

#[test]
fn test_two_letter_word() {
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    for letter in ["....", ".."] {
        camera.key(letter);
        camera.open(2.0);
    }
    assert_eq!(camera.session.message(), "HI");

    camera.open(5.0);
    assert_eq!(camera.session.message(), "HI ");

    let symbols = camera.events.iter().filter(|e| e.symbol.is_some()).count();
    assert_eq!(symbols, 6);
}

#[test]
fn test_slow_keying_splits_word() {
    // More than the space pause between two letter decodes inserts a space
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    camera.key("-");
    camera.open(2.0);
    camera.open(3.0);
    camera.key("-");
    camera.open(2.5);
    assert_eq!(camera.session.message(), "T T");
}

#[test]
fn test_unknown_sequence_yields_sentinel() {
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    camera.key("......");
    camera.open(2.5);
    assert_eq!(camera.session.message(), patterns::UNDECODABLE.to_string());
}

#[test]
fn test_face_lost_mid_word() {
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    camera.key(".-");
    // Detector loses the face; letter timing still advances
    camera.hold(None, 2.5);
    assert_eq!(camera.session.message(), "A");
}

#[test]
fn test_overlong_closure_is_ignored() {
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    camera.blink(3.5);
    camera.open(1.0);
    assert!(camera.events.is_empty());
    assert_eq!(camera.session.sequence(), "");
}

#[test]
fn test_reset_between_words() {
    let mut camera = Camera::new(Session::default());
    camera.open(1.0);
    camera.key("-");
    camera.open(2.5);
    assert_eq!(camera.session.message(), "T");

    let threshold = camera.session.threshold();
    camera.session.reset();
    assert_eq!(camera.session.message(), "");
    assert_eq!(camera.session.threshold(), threshold);

    camera.key("-");
    camera.open(2.5);
    assert_eq!(camera.session.message(), "T");
}

#[test]
fn test_calibrated_profile_changes_split() {
    let blink = |duration| BlinkEvent {
        duration,
        intensity: 0.1,
        timestamp: 0.0,
        min_ear: Some(0.06),
    };
    let dots: Vec<_> = [0.1, 0.12, 0.15, 0.13, 0.1, 0.11, 0.14, 0.15]
        .into_iter()
        .map(blink)
        .collect();
    let dashes: Vec<_> = [0.35, 0.4, 0.45, 0.38, 0.42, 0.36, 0.5, 0.41]
        .into_iter()
        .map(blink)
        .collect();
    let bundle: ModelBundle = blinkmorse_core::calibrate(&dots, &dashes).unwrap();
    assert!((bundle.dot_threshold - 0.25).abs() < 1e-9);

    let session = Session::with_classifier(SessionConfig::default(), Classifier::from_bundle(bundle));
    let mut camera = Camera::new(session);
    camera.open(1.0);
    // 0.4s would be a dot with the default threshold
    camera.blink(0.4);
    camera.open(2.5);
    assert_eq!(camera.session.message(), "T");
}
