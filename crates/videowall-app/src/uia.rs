//! Windows UI Automation backend.
//!
//! Every control is looked up once in `connect` and the element handles are
//! kept for the life of the process, the same way the player and switcher
//! stay open for the whole show.

use std::path::Path;
use std::time::{Duration, Instant};

use videowall_core::{
    AppLocator, Automation, Config, ControlLocator, ControlTypeRef, Error, Result, Target, WindowLocator,
};
use videowall_nav::Key;
use windows::Win32::Foundation::{CloseHandle, HWND};
use windows::Win32::System::Com::{CoCreateInstance, CoInitializeEx, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Accessibility::*;
use windows::Win32::UI::Input::KeyboardAndMouse::*;
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

const READY_POLL: Duration = Duration::from_millis(90);

fn uia_err(what: impl std::fmt::Display) -> impl FnOnce(windows::core::Error) -> Error {
    move |e| Error::Automation(format!("{what}: {}", e.message()))
}

pub struct UiaAutomation {
    switcher_window: IUIAutomationElement,
    dropdown: IUIAutomationElement,
    go_button: IUIAutomationElement,
    negate_colors: IUIAutomationElement,
    ready_timeout: Duration,
}

impl UiaAutomation {
    /// Attaches to both applications and binds every control the bridge uses.
    pub fn connect(config: &Config) -> Result<Self> {
        let uia: IUIAutomation = unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(uia_err("COM init"))?;
            CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER).map_err(uia_err("UI Automation"))?
        };
        let finder = Finder { uia: &uia };

        let player = &config.player;
        let effects = finder.window(&player.app, &player.window)?;
        let negate_colors = finder.control(&effects, &player.negate_colors)?;
        log::info!("bound player {} / {} / {}", player.app, player.window, player.negate_colors);

        let switcher = &config.switcher;
        let switcher_window = finder.window(&switcher.app, &switcher.window)?;
        let go_button = finder.control(&switcher_window, &switcher.go_button)?;
        let presets = finder.control(&switcher_window, &switcher.presets)?;
        let dropdown = finder.control(&presets, &switcher.dropdown)?;
        log::info!("bound switcher {} / {}", switcher.app, switcher.window);

        Ok(Self {
            switcher_window,
            dropdown,
            go_button,
            negate_colors,
            ready_timeout: config.ready_timeout(),
        })
    }

    fn element(&self, target: Target) -> &IUIAutomationElement {
        match target {
            Target::Dropdown => &self.dropdown,
            Target::GoButton => &self.go_button,
            Target::SwitcherWindow => &self.switcher_window,
            Target::NegateColors => &self.negate_colors,
        }
    }

    fn is_ready(&self, el: &IUIAutomationElement) -> Result<bool> {
        unsafe {
            let enabled = el.CurrentIsEnabled().map_err(uia_err("IsEnabled"))?.as_bool();
            let offscreen = el.CurrentIsOffscreen().map_err(uia_err("IsOffscreen"))?.as_bool();
            Ok(enabled && !offscreen)
        }
    }
}

impl Automation for UiaAutomation {
    fn click(&mut self, target: Target) -> Result<()> {
        unsafe {
            let pattern: IUIAutomationInvokePattern = self
                .element(target)
                .GetCurrentPatternAs(UIA_InvokePatternId)
                .map_err(uia_err(format!("{target} has no invoke pattern")))?;
            pattern.Invoke().map_err(uia_err(format!("click {target}")))
        }
    }

    fn click_input(&mut self, target: Target) -> Result<()> {
        let rect = unsafe { self.element(target).CurrentBoundingRectangle() }
            .map_err(uia_err(format!("bounds of {target}")))?;
        let (x, y) = ((rect.left + rect.right) / 2, (rect.top + rect.bottom) / 2);
        unsafe { SetCursorPos(x, y) }.map_err(uia_err(format!("move pointer to {target}")))?;
        send(&[
            mouse_input(MOUSEEVENTF_LEFTDOWN),
            mouse_input(MOUSEEVENTF_LEFTUP),
        ])
    }

    fn send_keys(&mut self, key: Key) -> Result<()> {
        send(&key_strokes(key))
    }

    fn wait_ready(&mut self, target: Target) -> Result<()> {
        let deadline = Instant::now() + self.ready_timeout;
        let el = self.element(target).clone();
        loop {
            if self.is_ready(&el)? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!("{target} to become ready")));
            }
            std::thread::sleep(READY_POLL);
        }
    }
}

/// Press and release. The arrows and Page Down sit in the extended key block,
/// so both events carry `KEYEVENTF_EXTENDEDKEY`.
fn key_strokes(key: Key) -> [INPUT; 2] {
    let vk = match key {
        Key::Down => VK_DOWN,
        Key::Up => VK_UP,
        Key::PageDown => VK_NEXT,
    };
    [
        key_input(vk, KEYEVENTF_EXTENDEDKEY),
        key_input(vk, KEYEVENTF_EXTENDEDKEY | KEYEVENTF_KEYUP),
    ]
}

fn key_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(Error::Automation(format!(
            "SendInput accepted {sent} of {} events: {}",
            inputs.len(),
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

struct Finder<'a> {
    uia: &'a IUIAutomation,
}

impl Finder<'_> {
    fn children(&self, parent: &IUIAutomationElement, scope: TreeScope) -> Result<Vec<IUIAutomationElement>> {
        unsafe {
            let cond = self.uia.CreateTrueCondition().map_err(uia_err("true condition"))?;
            let all = parent.FindAll(scope, &cond).map_err(uia_err("FindAll"))?;
            let len = all.Length().map_err(uia_err("FindAll length"))?;
            (0..len)
                .map(|i| all.GetElement(i).map_err(uia_err("FindAll element")))
                .collect()
        }
    }

    fn window(&self, app: &AppLocator, window: &WindowLocator) -> Result<IUIAutomationElement> {
        let found = match window {
            WindowLocator::Handle(h) => {
                let hwnd = HWND(*h as usize as *mut std::ffi::c_void);
                unsafe { self.uia.ElementFromHandle(hwnd) }.ok()
            }
            WindowLocator::Title(title) => {
                let root = unsafe { self.uia.GetRootElement() }.map_err(uia_err("desktop root"))?;
                self.children(&root, TreeScope_Children)?
                    .into_iter()
                    .find(|el| unsafe { el.CurrentName() }.map(|n| n.to_string() == *title).unwrap_or(false))
            }
        };
        match found {
            Some(el) if owned_by(&el, app) => Ok(el),
            Some(_) => Err(Error::Lookup(format!("{window} belongs to another process than {app}"))),
            None => Err(Error::Lookup(format!("{window} of {app}"))),
        }
    }

    fn control(&self, parent: &IUIAutomationElement, loc: &ControlLocator) -> Result<IUIAutomationElement> {
        let candidates = self.children(parent, TreeScope_Descendants)?;
        let found = match loc {
            ControlLocator::AutomationId(id) => candidates
                .into_iter()
                .find(|el| unsafe { el.CurrentAutomationId() }.map(|a| a.to_string() == *id).unwrap_or(false)),
            ControlLocator::Name(name) => candidates
                .into_iter()
                .find(|el| unsafe { el.CurrentName() }.map(|n| n.to_string() == *name).unwrap_or(false)),
            ControlLocator::ControlType(r) => {
                let kind = control_type_id(r)?;
                candidates
                    .into_iter()
                    .filter(|el| unsafe { el.CurrentControlType() }.map(|t| t == kind).unwrap_or(false))
                    .nth(r.position())
            }
        };
        found.ok_or_else(|| Error::Lookup(loc.to_string()))
    }
}

fn owned_by(el: &IUIAutomationElement, app: &AppLocator) -> bool {
    let Ok(pid) = (unsafe { el.CurrentProcessId() }) else {
        return false;
    };
    let pid = pid as u32;
    match app {
        AppLocator::ProcessId(want) => pid == *want,
        AppLocator::ExePath(want) => {
            let want = file_name(want);
            process_exe_path(pid)
                .map(|path| file_name(&path).eq_ignore_ascii_case(&want))
                .unwrap_or(false)
        }
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn process_exe_path(pid: u32) -> Option<String> {
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;

        let mut buffer = [0u16; 1024];
        let mut size = buffer.len() as u32;
        let result = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            windows::core::PWSTR(buffer.as_mut_ptr()),
            &mut size,
        );
        let _ = CloseHandle(handle);

        if result.is_ok() && size > 0 {
            Some(String::from_utf16_lossy(&buffer[..size as usize]))
        } else {
            None
        }
    }
}

fn control_type_id(r: &ControlTypeRef) -> Result<UIA_CONTROLTYPE_ID> {
    Ok(match r.kind.as_str() {
        "Button" => UIA_ButtonControlTypeId,
        "CheckBox" => UIA_CheckBoxControlTypeId,
        "ComboBox" => UIA_ComboBoxControlTypeId,
        "Edit" => UIA_EditControlTypeId,
        "List" => UIA_ListControlTypeId,
        "ListItem" => UIA_ListItemControlTypeId,
        "MenuItem" => UIA_MenuItemControlTypeId,
        "Pane" => UIA_PaneControlTypeId,
        "RadioButton" => UIA_RadioButtonControlTypeId,
        "Slider" => UIA_SliderControlTypeId,
        "Tab" => UIA_TabControlTypeId,
        "TabItem" => UIA_TabItemControlTypeId,
        "Text" => UIA_TextControlTypeId,
        "Window" => UIA_WindowControlTypeId,
        other => return Err(Error::Lookup(format!("unknown control type {other:?} in {r}"))),
    })
}
