#![allow(dead_code)]

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Write a raw HTTP/1.1 request and read until the server goes quiet.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    pub struct ParsedResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl ParsedResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    pub fn parse_response(resp: &str) -> ParsedResponse {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut status = 0;
        let mut headers = Vec::new();
        for line in head.lines() {
            if line.starts_with("HTTP/1.1") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                headers.push((name.trim().to_string(), val.trim().to_string()));
            }
        }
        ParsedResponse {
            status,
            headers,
            body: body.to_string(),
        }
    }
}

pub mod fixtures {
    use std::sync::{Arc, Mutex};

    use actionwire::component::{Component, ComponentConfig, ComponentContext, Flow};
    use actionwire::controller::{
        ActionContext, ActionName, Controller, ControllerBuilder, ControllerDescriptor,
        HandlerResult,
    };
    use actionwire::template::MiniJinjaStore;
    use actionwire::{DispatchError, Request, Response};
    use http::Method;
    use serde_json::json;

    /// Ordered record of everything the pipeline called.
    pub type Log = Arc<Mutex<Vec<String>>>;

    pub fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    pub fn count(log: &Log, entry: &str) -> usize {
        log.lock().unwrap().iter().filter(|e| e.as_str() == entry).count()
    }

    fn push(log: &Log, entry: impl Into<String>) {
        log.lock().unwrap().push(entry.into());
    }

    pub fn request(method: Method, path: &str) -> Request {
        Request::builder(method, path).build()
    }

    pub fn get(path: &str) -> Request {
        request(Method::GET, path)
    }

    /// Component that logs its callbacks and answers with preset flows.
    pub struct Recorder {
        name: String,
        log: Log,
        before: Flow,
        after: Flow,
        panic_in: Option<&'static str>,
    }

    impl Recorder {
        pub fn new(name: &str, log: &Log) -> Self {
            Self {
                name: name.to_string(),
                log: Arc::clone(log),
                before: Flow::Continue,
                after: Flow::Continue,
                panic_in: None,
            }
        }

        pub fn before(mut self, flow: Flow) -> Self {
            self.before = flow;
            self
        }

        pub fn after(mut self, flow: Flow) -> Self {
            self.after = flow;
            self
        }

        /// Panic in `"before"` or `"after"` after logging the call.
        pub fn panicking(mut self, phase: &'static str) -> Self {
            self.panic_in = Some(phase);
            self
        }
    }

    impl Component for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn before(&self, _req: &Request, cx: &ComponentContext<'_>) -> Flow {
            match cx.config.get_str("mark") {
                Some(mark) => push(&self.log, format!("{}.before[{mark}]", self.name)),
                None => push(&self.log, format!("{}.before", self.name)),
            }
            if self.panic_in == Some("before") {
                panic!("{} before blew up", self.name);
            }
            self.before.clone()
        }

        fn after(&self, _req: &Request, res: &mut Response, cx: &ComponentContext<'_>) -> Flow {
            let action = cx.action.map(|a| a.to_string()).unwrap_or_default();
            push(&self.log, format!("{}.after:{}:{action}", self.name, res.status));
            if self.panic_in == Some("after") {
                panic!("{} after blew up", self.name);
            }
            self.after.clone()
        }
    }

    /// Controller mounted as `Widgets` in the pipeline tests.
    pub struct WidgetsFixture {
        log: Log,
    }

    impl Controller for WidgetsFixture {
        fn prepare_component(&mut self, component: &str, request: &Request) -> Option<ComponentConfig> {
            push(&self.log, format!("prepare:{component}"));
            if request.param("panic") == Some(component) {
                panic!("prepare_component failed for {component}");
            }
            request
                .param("mark")
                .map(|mark| ComponentConfig::new().with("mark", json!(mark)))
        }

        fn pre_process_request(&mut self, ctx: &mut ActionContext<'_>) {
            push(&self.log, "pre_process");
            let request = ctx.request();
            if let Some(view) = request.param("view") {
                ctx.set_view(view);
            }
            match request.param("layout") {
                Some("none") => ctx.disable_layout(),
                Some(layout) => ctx.set_layout(layout),
                None => {}
            }
        }

        fn action_for_name(&self, name: Option<&str>, _request: &Request) -> Option<ActionName> {
            push(&self.log, "action_for_name");
            match name {
                Some("lookup") => Some(ActionName::object()),
                Some("ghost") => Some(ActionName::new("ghostAction")),
                _ => None,
            }
        }

        fn post_process_response(&mut self, response: Response, _ctx: &ActionContext<'_>) -> Response {
            push(&self.log, "post_process");
            response.with_header("x-post-processed", "yes")
        }
    }

    impl WidgetsFixture {
        fn index(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "index");
            Ok(json!({ "items": [] }).into())
        }

        fn object(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
            let id = ctx.identifier().unwrap_or_default().to_string();
            push(&self.log, format!("object:{id}"));
            if id == "404" {
                return Err(DispatchError::not_found("no widget 404").into());
            }
            Ok(json!({ "id": id }).into())
        }

        fn create(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "create");
            Ok(Response::json(201, json!({ "created": true }))
                .with_header("x-handler", "create")
                .into())
        }

        fn update(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
            let id = ctx.identifier().unwrap_or_default().to_string();
            push(&self.log, format!("update:{id}"));
            Ok(json!({ "updated": id }).into())
        }

        fn delete(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, format!("delete:{}", ctx.identifier().unwrap_or("-")));
            Ok(Response::new(204).into())
        }

        fn search(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "search");
            Ok(json!({ "q": ctx.rest().join("/") }).into())
        }

        fn init_search(&mut self, ctx: &mut ActionContext<'_>) {
            push(&self.log, "initSearchAction");
            ctx.set_view("SearchResultsView");
        }

        fn boom(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "boom");
            Err(anyhow::anyhow!("kaboom"))
        }

        fn explode(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "explode");
            panic!("handler blew up");
        }

        fn misconfigured(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "misconfigured");
            Ok(json!({}).into())
        }

        fn init_misconfigured(&mut self, ctx: &mut ActionContext<'_>) {
            ctx.set_view("NoSuchView");
        }

        fn abandon(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "abandon");
            ctx.request().meta().cancel.cancel();
            Ok(json!({}).into())
        }

        fn reroute(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
            push(&self.log, "reroute");
            ctx.set_view("OtherView");
            Ok(json!({ "q": "late" }).into())
        }
    }

    /// The `Widgets` fixture controller with `components` in its chain.
    pub fn widgets_controller(log: &Log, components: &[&str]) -> ControllerDescriptor<WidgetsFixture> {
        let shared = Arc::clone(log);
        let mut builder = ControllerBuilder::new("Widgets", move || WidgetsFixture {
            log: Arc::clone(&shared),
        })
        .index(WidgetsFixture::index)
        .object(WidgetsFixture::object)
        .create(WidgetsFixture::create)
        .update(WidgetsFixture::update)
        .delete(WidgetsFixture::delete)
        .action("search", WidgetsFixture::search)
        .init(ActionName::explicit("search"), WidgetsFixture::init_search)
        .action("boom", WidgetsFixture::boom)
        .action("explode", WidgetsFixture::explode)
        .action("misconfigured", WidgetsFixture::misconfigured)
        .init(ActionName::explicit("misconfigured"), WidgetsFixture::init_misconfigured)
        .action("abandon", WidgetsFixture::abandon)
        .action("reroute", WidgetsFixture::reroute);
        for name in components {
            builder = builder.component(name);
        }
        builder.build().unwrap()
    }

    /// Templates used by the rendering tests.
    pub fn widget_templates() -> MiniJinjaStore {
        MiniJinjaStore::from_sources([
            ("IndexWidgetsView", "<ul>{{ items|length }}</ul>"),
            ("ObjectWidgetsView", "<p>{{ id }}</p>"),
            ("SearchWidgetsView", "<wrong/>"),
            ("SearchResultsView", "<s>{{ q }}</s>"),
            ("RerouteWidgetsView", "<r>{{ q }}</r>"),
            ("OtherView", "<o>{{ q }}</o>"),
            ("SiteLayout", "<body>{{ content }}</body>"),
            ("PlainLayout", "[{{ content }}]"),
        ])
    }
}
