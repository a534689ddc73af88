//! The page controller.
//!
//! One controller is created per page open. It owns the session state, the
//! dwell gate, the scarcity countdown, and gallery rotation, and it is the
//! only writer of all of them. Handlers re-validate their guard flags on
//! entry: the dwell gate and the countdown expiry race to the same
//! continue-enable transition, and whichever loses must degrade to a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use scarab_core::condition::{self, Condition};
use scarab_core::config::PageConfig;
use scarab_core::content::{ContentKind, ContentSections};
use scarab_core::countdown::Countdown;
use scarab_core::event::{Action, Envelope, SubAction};
use scarab_core::gallery::Gallery;
use scarab_core::message::ScarcityMessage;
use scarab_core::platform::ClientEnvironment;
use scarab_core::query::PageRequest;
use scarab_core::redirect;
use scarab_core::session::{ExperimentPhase, Session};
use scarab_core::{Result, ScarabError};
use scarab_telemetry::TelemetryDispatcher;

use crate::gate::DwellGate;
use crate::view::{CartControlState, PageView};

/// Static page content: section titles and the image count. The rendering
/// surface owns the actual copy and imagery.
#[derive(Debug, Clone)]
pub struct PageCatalog {
    pub product_detail_titles: Vec<String>,
    pub faq_titles: Vec<String>,
    pub image_count: usize,
}

impl Default for PageCatalog {
    fn default() -> Self {
        Self {
            product_detail_titles: vec![
                "Specifications".to_string(),
                "What's in the Box".to_string(),
                "Shipping & Returns".to_string(),
            ],
            faq_titles: vec![
                "How fast does it charge?".to_string(),
                "Does it work with cases?".to_string(),
                "What is the warranty?".to_string(),
            ],
            image_count: 4,
        }
    }
}

pub struct PageController<V: PageView> {
    config: PageConfig,
    environment: ClientEnvironment,
    view: V,
    telemetry: TelemetryDispatcher,
    session: RwLock<Session>,
    content: RwLock<ContentSections>,
    gallery: RwLock<Gallery>,
    countdown: RwLock<Countdown>,
    gate: DwellGate,
    countdown_task: Mutex<Option<JoinHandle<()>>>,
    rotation_task: Mutex<Option<JoinHandle<()>>>,
    last_focus_event: Mutex<Option<Instant>>,
    unloaded: AtomicBool,
}

impl<V: PageView> std::fmt::Debug for PageController<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("config", &self.config)
            .field("environment", &self.environment)
            .field("unloaded", &self.unloaded.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<V: PageView> PageController<V> {
    /// Initializes the page: assigns the condition, renders the scarcity
    /// message, schedules the dwell gate (and the countdown for the time
    /// condition), starts gallery rotation, and emits the page-load event.
    ///
    /// Fails with [`ScarabError::MissingElement`] when the view cannot
    /// provide an essential affordance; nothing is scheduled in that case.
    pub async fn open(
        config: PageConfig,
        catalog: PageCatalog,
        request: PageRequest,
        environment: ClientEnvironment,
        telemetry: TelemetryDispatcher,
        view: V,
    ) -> Result<Arc<Self>> {
        if let Some(element) = view.missing_essential() {
            tracing::error!("essential page element not found: {element}; aborting setup");
            return Err(ScarabError::missing_element(element));
        }

        let platform = environment.platform();
        let (assigned, assignment) =
            condition::assign(request.condition_param.as_deref(), &mut rand::thread_rng());
        tracing::info!(
            "initial setup: pid={}, platform={platform}, condition={assigned}",
            request.participant_id
        );

        let session = Session::new(
            request.participant_id.clone(),
            platform,
            assigned,
            assignment,
        );
        let detail_titles: Vec<&str> = catalog
            .product_detail_titles
            .iter()
            .map(String::as_str)
            .collect();
        let faq_titles: Vec<&str> = catalog.faq_titles.iter().map(String::as_str).collect();

        let controller = Arc::new(Self {
            environment,
            view,
            telemetry,
            session: RwLock::new(session),
            content: RwLock::new(ContentSections::new(&detail_titles, &faq_titles)),
            gallery: RwLock::new(Gallery::new(catalog.image_count)),
            countdown: RwLock::new(Countdown::new(config.countdown_secs)),
            gate: DwellGate::new(),
            countdown_task: Mutex::new(None),
            rotation_task: Mutex::new(None),
            last_focus_event: Mutex::new(None),
            unloaded: AtomicBool::new(false),
            config,
        });

        controller
            .emit(
                Action::PageLoad,
                Some(SubAction::ExperimentStart),
                None,
                vec![
                    (
                        "experimentInfo",
                        json!({
                            "minimumViewTime": controller.config.minimum_view_secs,
                            "conditionType": assigned,
                            "conditionAssignment": assignment,
                            "referrer": controller.environment.referrer_or_direct(),
                        }),
                    ),
                    (
                        "deviceInfo",
                        json!({
                            "viewportWidth": controller.environment.viewport_width,
                            "viewportHeight": controller.environment.viewport_height,
                            "pixelRatio": controller.environment.pixel_ratio,
                            "language": controller.environment.language,
                        }),
                    ),
                    ("urlParams", json!(request.raw_params)),
                ],
            )
            .await;

        let message = ScarcityMessage::for_condition(assigned, controller.config.countdown_secs);
        controller.view.render_scarcity(&message);

        if assigned == Condition::Time {
            controller.spawn_countdown();
        }
        controller.schedule_dwell_gate();
        controller.spawn_gallery_rotation();

        Ok(controller)
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// The conversion signal. No-op when the control is already disabled.
    pub async fn add_to_cart(&self) {
        let time_to_conversion = {
            let mut session = self.session.write().await;
            if !session.mark_cart_clicked() {
                return;
            }
            session.time_on_page_secs()
        };
        let sections_expanded = self.content.read().await.expanded_count();

        self.view.set_cart_state(CartControlState::Converted);
        self.view.notify("Product added to cart!");
        tracing::info!("add to cart clicked");

        self.emit(
            Action::Conversion,
            Some(SubAction::AddToCart),
            None,
            vec![
                ("timeToConversion", json!(time_to_conversion)),
                ("scarcityVisible", json!(true)),
                ("sectionsExpandedCount", json!(sections_expanded)),
            ],
        )
        .await;

        self.enable_continue().await;
    }

    /// Finishes the session: emits the exit event and returns the survey
    /// redirect URL. Returns `Ok(None)` while continue is still disabled.
    ///
    /// An unconfigured survey URL is the one loud failure on this page:
    /// the visitor is told, and no navigation happens. The exit event has
    /// already been emitted at that point, matching the action order of
    /// the continue handler it models.
    pub async fn continue_to_survey(&self) -> Result<Option<String>> {
        let (duration_secs, interactions) = {
            let session = self.session.read().await;
            if !session.continue_enabled() {
                return Ok(None);
            }
            (session.time_on_page_secs(), session.interaction_count())
        };
        tracing::info!("continue clicked; preparing redirection");

        let per_minute = if duration_secs > 0 {
            interactions as f64 / (duration_secs as f64 / 60.0)
        } else {
            0.0
        };
        let (expanded, sections_expanded) = {
            let content = self.content.read().await;
            (content.expanded(), content.expanded_count())
        };
        let conversion_result = self.session.read().await.conversion_result();

        self.emit(
            Action::PageExit,
            Some(SubAction::SurveyRedirect),
            None,
            vec![
                (
                    "sessionMetrics",
                    json!({
                        "duration": duration_secs,
                        "interactionsCount": interactions,
                        "interactionsPerMinute": format!("{per_minute:.2}"),
                        "expandedSections": expanded,
                        "sectionsExpandedCount": sections_expanded,
                    }),
                ),
                ("conversionResult", json!(conversion_result)),
            ],
        )
        .await;

        let Some(base) = self.config.survey_base_url.as_deref() else {
            tracing::error!("post-survey URL is not configured; cannot redirect");
            self.view.notify("Error: Survey URL is missing. Cannot proceed.");
            return Err(ScarabError::SurveyUrlMissing);
        };

        let session = self.session.read().await;
        let url = redirect::survey_redirect_url(base, &session, duration_secs)?;
        tracing::info!("redirecting to {url}");
        Ok(Some(url))
    }

    /// Toggles an accordion/FAQ section. Only openings are logged.
    pub async fn toggle_section(&self, kind: ContentKind, index: usize) {
        let opened = self.content.write().await.group_mut(kind).toggle(index);
        let Some(opened) = opened else { return };

        let sub_action = match kind {
            ContentKind::ProductDetails => SubAction::AccordionOpen,
            ContentKind::Faq => SubAction::FaqOpen,
        };
        self.emit(
            Action::ContentExpand,
            Some(sub_action),
            None,
            vec![
                ("contentType", json!(kind)),
                ("contentId", json!(opened.content_id)),
                ("sectionTitle", json!(opened.section_title)),
                ("contentIndex", json!(opened.content_index)),
            ],
        )
        .await;
    }

    /// Jumps the gallery to `index` (wrapping) and restarts auto-rotation.
    pub async fn select_image(self: &Arc<Self>, index: isize) {
        let (current, count) = {
            let mut gallery = self.gallery.write().await;
            (gallery.select(index), gallery.image_count())
        };
        self.view.render_gallery(current, count);
        self.spawn_gallery_rotation();
    }

    pub async fn next_image(self: &Arc<Self>) {
        let current = self.gallery.read().await.current() as isize;
        self.select_image(current + 1).await;
    }

    pub async fn prev_image(self: &Arc<Self>) {
        let current = self.gallery.read().await.current() as isize;
        self.select_image(current - 1).await;
    }

    /// Pointer activity over the product details region, throttled to at
    /// most one event per debounce window.
    pub async fn product_details_focus(&self) {
        let now = Instant::now();
        {
            let mut last = self.last_focus_event.lock().unwrap();
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.config.focus_debounce() {
                    return;
                }
            }
            *last = Some(now);
        }
        self.emit(Action::ProductDetailsFocus, None, None, vec![]).await;
    }

    /// Page teardown: cancels every scheduled task, then flushes the final
    /// exit event through the bounded unload-safe path. Idempotent.
    pub async fn unload(&self) {
        if self.unloaded.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("page unloading; cleaning up resources");

        self.gate.cancel();
        if let Some(handle) = self.countdown_task.lock().unwrap().take() {
            handle.abort();
        }
        if let Some(handle) = self.rotation_task.lock().unwrap().take() {
            handle.abort();
        }

        let (expanded, sections_expanded) = {
            let content = self.content.read().await;
            (content.expanded(), content.expanded_count())
        };
        let envelope = {
            let mut session = self.session.write().await;
            session.set_countdown_running(false);
            let duration = session.time_on_page_secs();
            let interactions = session.interaction_count();
            let conversion_result = session.conversion_result();
            Envelope::new(
                &mut session,
                &self.environment,
                expanded.clone(),
                Action::PageExit,
            )
            .sub_action(SubAction::BrowserUnload)
            .detail(
                "sessionMetrics",
                json!({
                    "duration": duration,
                    "interactionCount": interactions,
                    "expandedSections": expanded,
                    "sectionsExpandedCount": sections_expanded,
                    "completed": false,
                }),
            )
            .detail("conversionResult", json!(conversion_result))
        };
        self.telemetry
            .dispatch_final(envelope, self.config.final_flush_timeout())
            .await;
    }

    // ------------------------------------------------------------------
    // State accessors (for the front end's status display)
    // ------------------------------------------------------------------

    pub async fn session_snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn content_snapshot(&self) -> ContentSections {
        self.content.read().await.clone()
    }

    pub async fn gallery_snapshot(&self) -> Gallery {
        *self.gallery.read().await
    }

    // ------------------------------------------------------------------
    // Internal transitions
    // ------------------------------------------------------------------

    /// The single continue-enable transition. Both scheduled triggers and
    /// the conversion path funnel here; only the first caller acts.
    async fn enable_continue(&self) {
        {
            let mut session = self.session.write().await;
            if !session.enable_continue() {
                return;
            }
            session.disable_cart();
        }
        self.gate.cancel();
        tracing::info!("enabling continue and disabling add to cart");

        self.view.set_cart_state(self.cart_view_state().await);
        self.view.reveal_continue();

        self.emit(Action::ContinueButtonEnabled, None, None, vec![]).await;
    }

    async fn on_countdown_expired(&self) {
        let elapsed = self.countdown.read().await.elapsed();
        {
            let mut session = self.session.write().await;
            session.set_countdown_running(false);
            session.disable_cart();
        }
        self.view.render_scarcity_expired();
        self.view.set_cart_state(self.cart_view_state().await);

        self.emit(
            Action::TimerExpired,
            None,
            None,
            vec![("timeViewedSeconds", json!(elapsed))],
        )
        .await;
        tracing::info!("time scarcity offer expired");

        self.enable_continue().await;
    }

    fn schedule_dwell_gate(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        tracing::debug!(
            "starting minimum viewing timer ({}s)",
            self.config.minimum_view_secs
        );
        self.gate.schedule(self.config.minimum_view(), async move {
            tracing::debug!("minimum viewing time elapsed");
            controller
                .emit(
                    Action::TimeThreshold,
                    Some(SubAction::MinViewTimeReached),
                    Some(ExperimentPhase::TimedThresholdReached),
                    vec![],
                )
                .await;
            controller.enable_continue().await;
        });
    }

    fn spawn_countdown(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        let lead_in = self.config.countdown_lead_in();
        let handle = tokio::spawn(async move {
            // Lead-in so the rendered countdown is noticed before it moves.
            tokio::time::sleep(lead_in).await;
            controller.countdown.write().await.start();
            controller.session.write().await.set_countdown_running(true);

            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // first tick resolves immediately
            loop {
                interval.tick().await;
                let tick = controller.countdown.write().await.tick();
                let Some(tick) = tick else { break };
                controller
                    .view
                    .render_countdown(&tick.display(), tick.urgency());
                if tick.expired {
                    controller.on_countdown_expired().await;
                    break;
                }
            }
        });
        if let Some(previous) = self.countdown_task.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// (Re)starts auto-rotation; manual navigation calls this to push the
    /// next automatic advance a full period out.
    fn spawn_gallery_rotation(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        let period = self.config.gallery_rotate();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let (current, count) = {
                    let mut gallery = controller.gallery.write().await;
                    (gallery.next(), gallery.image_count())
                };
                controller.view.render_gallery(current, count);
            }
        });
        if let Some(previous) = self.rotation_task.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// Builds and dispatches one envelope. Suppressed entirely after
    /// unload so nothing can log into a torn-down page.
    async fn emit(
        &self,
        action: Action,
        sub_action: Option<SubAction>,
        phase: Option<ExperimentPhase>,
        details: Vec<(&'static str, Value)>,
    ) {
        if self.unloaded.load(Ordering::SeqCst) {
            return;
        }
        let expanded = self.content.read().await.expanded();
        let mut envelope = {
            let mut session = self.session.write().await;
            Envelope::new(&mut session, &self.environment, expanded, action)
        };
        if let Some(sub_action) = sub_action {
            envelope = envelope.sub_action(sub_action);
        }
        if let Some(phase) = phase {
            envelope = envelope.phase(phase);
        }
        for (key, value) in details {
            envelope = envelope.detail(key, value);
        }
        // Fire-and-forget: the handle is deliberately dropped.
        let _ = self.telemetry.dispatch(envelope);
    }

    async fn cart_view_state(&self) -> CartControlState {
        let session = self.session.read().await;
        if session.cart_clicked() {
            CartControlState::Converted
        } else if session.cart_enabled() {
            CartControlState::Enabled
        } else {
            CartControlState::Disabled
        }
    }
}
