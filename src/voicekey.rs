use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arboard::Clipboard;
use enigo::Enigo;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use parking_lot::RwLock;
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tray_icon::menu::{AboutMetadataBuilder, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIconBuilder, TrayIconEvent};
use voicekey::config_ext::ConfigExt;
use voicekey::connectivity::ConnectivityMonitor;
use voicekey::event::{AppEvent, EventLoopBridge};
use voicekey::focus::UnknownFocusProbe;
use voicekey::notify::{NotificationLayer, SystemNotifier, notify};
use voicekey::overlay::OverlayBridge;
use voicekey::session::{Collaborators, SessionController};
use voicekey::{
    ConfigManager, DEFAULT_LOG_LEVEL, FocusTarget, HotkeyBinding, Listening, MicCapture,
    Processing, SessionState, StatusPatch, VERSION, VoxtralClient, icon,
};

fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VOICEKEY_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .finish()
        .with(NotificationLayer::new())
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = Arc::new(RwLock::new(config_manager.load()?));
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config.read())?;

    // Async runtime for the overlay hide timer, the connectivity loop and
    // transcription uploads. One worker is plenty.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    // Set up hotkeys: one logical key, possibly several physical codes
    let hotkey_manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
    let hotkeys = config.read().hotkeys();
    hotkey_manager
        .register_all(&hotkeys)
        .context("Failed to register hotkey")?;
    let binding = HotkeyBinding::new(hotkeys.iter().map(|k| k.id()).collect());

    let overlay = OverlayBridge::new(runtime.handle().clone());
    let monitor = ConnectivityMonitor::new(overlay.clone());
    monitor.start(runtime.handle(), config.clone());
    monitor.kick();

    let event_loop: EventLoop<AppEvent> = EventLoopBuilder::with_user_event().build();
    let bridge = Arc::new(EventLoopBridge::new(event_loop.create_proxy()));

    let collaborators = Collaborators {
        transcriber: Arc::new(VoxtralClient::new()?),
        injector: bridge.clone(),
        focus: Arc::new(UnknownFocusProbe),
        notifier: Arc::new(SystemNotifier),
        status: bridge,
    };

    let mut controller = SessionController::new(
        config.clone(),
        Box::new(MicCapture::new()),
        overlay.clone(),
        monitor.clone(),
        collaborators,
        runtime.handle().clone(),
        binding,
    );

    // Prime the overlay, then keep it hidden until a session starts
    overlay.update(
        &StatusPatch::new()
            .connection(monitor.state())
            .listening(Listening::Ready)
            .processing(Processing::Idle)
            .target(FocusTarget::Unknown)
            .message(format!("Hold {} to talk", config.read().hotkey)),
    );
    overlay.hide();

    // Set up keyboard and clipboard interaction
    let mut enigo = Enigo::new(&enigo::Settings::default())
        .map_err(|e| anyhow::anyhow!("Failed to initialize input synthesis: {e}"))?;
    let mut clipboard = Clipboard::new()?;

    // Create the tray menu
    let tray_menu = Menu::new();
    let icon_quit = MenuItem::new("Quit", true, None);
    let icon_copy_config = MenuItem::new("Copy config path", true, None);
    tray_menu.append_items(&[
        // the name of the app
        &MenuItem::new("VoiceKey", false, None),
        &PredefinedMenuItem::separator(),
        &PredefinedMenuItem::about(
            None,
            Some(
                AboutMetadataBuilder::new()
                    .version(Some(VERSION.to_owned()))
                    .build(),
            ),
        ),
        &icon_copy_config,
        &PredefinedMenuItem::separator(),
        &icon_quit,
    ])?;

    // Set up the event loop
    let mut icon_tray = None;

    let menu_channel = MenuEvent::receiver();
    let tray_channel = TrayIconEvent::receiver();
    let hotkey_channel = GlobalHotKeyEvent::receiver();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::NewEvents(StartCause::Init) = event {
            // We create the icon once the event loop is actually running
            // to prevent issues like https://github.com/tauri-apps/tray-icon/issues/90

            icon_tray.replace(
                TrayIconBuilder::new()
                    .with_menu(Box::new(tray_menu.clone()))
                    .with_tooltip(icon::state_tooltip(SessionState::Idle))
                    .with_icon(icon::state_icon(SessionState::Idle))
                    .build()
                    .unwrap(),
            );

            // We have to request a redraw here to have the icon actually show up.
            // Tao only exposes a redraw method on the Window so we use core-foundation directly.
            #[cfg(target_os = "macos")]
            unsafe {
                use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};

                let rl = CFRunLoopGetMain();
                CFRunLoopWakeUp(rl);
            }

            // First-run nudge: without a key, sessions can only fail
            if config.read().api_key().is_none() {
                runtime.spawn(async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    notify(
                        "setup",
                        "Welcome! Copy the config path from the tray menu and add your API key.",
                    );
                });
            }

            info!("VoiceKey ready");
        }

        if let Ok(event) = menu_channel.try_recv() {
            if event.id == icon_quit.id() {
                controller.shutdown();
                monitor.stop();
                overlay.stop();
                icon_tray.take();
                *control_flow = ControlFlow::Exit;
            } else if event.id == icon_copy_config.id() {
                if let Err(e) =
                    clipboard.set_text(config_manager.config_path().to_string_lossy().into_owned())
                {
                    error!("Failed to copy config path to clipboard: {}", e);
                }
            }
        }

        #[expect(clippy::redundant_pattern_matching)]
        if let Ok(_) = tray_channel.try_recv() {
            // Handle tray icon events
        }

        // Handle user provided events
        if let Event::UserEvent(event) = event {
            match event {
                AppEvent::StateChanged(state) => {
                    info!(state = ?state, "State changed");
                    if let Some(tray) = icon_tray.as_ref() {
                        tray.set_icon(Some(icon::state_icon(state))).ok();
                        tray.set_tooltip(Some(icon::state_tooltip(state))).ok();
                    }
                }
                AppEvent::TranscriptReady(text) => {
                    let paste_mode = config.read().paste_mode;
                    if let Err(e) =
                        voicekey::inject::deliver(&mut enigo, &mut clipboard, &text, paste_mode)
                    {
                        warn!("Failed to deliver transcription: {}", e);
                    }
                }
            };
        }

        // Handle hotkey events
        if let Ok(event) = hotkey_channel.try_recv() {
            match event.state() {
                HotKeyState::Pressed => controller.key_down(event.id()),
                HotKeyState::Released => controller.key_up(event.id()),
            }
        }
    });
}
