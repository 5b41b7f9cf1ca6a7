//! Presentation sinks.
//!
//! The analyzer never draws anything itself. It reports the growing
//! remediation text and user-facing notices to a [`PresentationSink`].

pub mod panel;
pub mod terminal;

pub use panel::HtmlPanel;
pub use terminal::TerminalSink;

/// A user-facing message emitted during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transient status while waiting on a remote call.
    Progress(String),
    /// Informational message.
    Info(String),
    /// Something the user should act on; the session did not fail.
    Warning(String),
    /// The session failed.
    Error(String),
    /// The terminal fragment arrived.
    Completed,
}

/// Receives the accumulated remediation text and notices, in order.
pub trait PresentationSink {
    /// Replace the displayed text with `accumulated`.
    ///
    /// Called once per applied fragment. Each call carries the full text so
    /// far, never just the delta.
    fn render(&mut self, accumulated: &str);

    /// Show a notice to the user.
    fn notify(&mut self, notice: Notice);
}

impl<S: PresentationSink + ?Sized> PresentationSink for Box<S> {
    fn render(&mut self, accumulated: &str) {
        (**self).render(accumulated)
    }

    fn notify(&mut self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Fan out to every sink, in order.
impl PresentationSink for Vec<Box<dyn PresentationSink>> {
    fn render(&mut self, accumulated: &str) {
        for sink in self.iter_mut() {
            sink.render(accumulated);
        }
    }

    fn notify(&mut self, notice: Notice) {
        for sink in self.iter_mut() {
            sink.notify(notice.clone());
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records everything it is given.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub renders: Vec<String>,
        pub notices: Vec<Notice>,
    }

    impl RecordingSink {
        pub fn errors(&self) -> Vec<&str> {
            self.notices
                .iter()
                .filter_map(|n| match n {
                    Notice::Error(message) => Some(message.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn completions(&self) -> usize {
            self.notices
                .iter()
                .filter(|n| matches!(n, Notice::Completed))
                .count()
        }
    }

    impl PresentationSink for RecordingSink {
        fn render(&mut self, accumulated: &str) {
            self.renders.push(accumulated.to_string());
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct LabelledSink {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl PresentationSink for LabelledSink {
        fn render(&mut self, accumulated: &str) {
            self.log
                .borrow_mut()
                .push(format!("{}:render:{}", self.label, accumulated));
        }

        fn notify(&mut self, notice: Notice) {
            self.log
                .borrow_mut()
                .push(format!("{}:{:?}", self.label, notice));
        }
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sinks: Vec<Box<dyn PresentationSink>> = vec![
            Box::new(LabelledSink {
                label: "a",
                log: Rc::clone(&log),
            }),
            Box::new(LabelledSink {
                label: "b",
                log: Rc::clone(&log),
            }),
        ];

        sinks.render("x");
        sinks.notify(Notice::Completed);

        assert_eq!(
            *log.borrow(),
            vec!["a:render:x", "b:render:x", "a:Completed", "b:Completed"]
        );
    }

    #[test]
    fn test_recording_sink_counts() {
        let mut sink = RecordingSink::default();
        sink.notify(Notice::Error("boom".to_string()));
        sink.notify(Notice::Completed);
        sink.render("x");
        assert_eq!(sink.errors(), vec!["boom"]);
        assert_eq!(sink.completions(), 1);
        assert_eq!(sink.renders, vec!["x".to_string()]);
    }
}
