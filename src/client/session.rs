/// WebSocket session actor for the duel event channel.
///
/// This actor owns the connected socket and the duel state machine. Incoming
/// frames and local commands are fed into the machine; the effect lists it
/// returns are executed here (frames written, the search timer scheduled or
/// cancelled, regions rendered). The actor context serializes everything, so
/// machine transitions never overlap.
use actix::io::SinkWrite;
use actix::prelude::*;
use actix_codec::Framed;
use awc::BoxedSocket;
use awc::error::WsProtocolError;
use awc::ws::{Codec, Frame, Message as WsFrame};
use futures_util::stream::{SplitSink, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::oneshot;

use crate::client::presenter::Presenter;
use crate::duel::machine::{ConnectionEvent, DuelClient, Effect, Region};
use crate::duel::messages::{ClientWsMessage, ServerWsMessage};

type WsSink = SinkWrite<WsFrame, SplitSink<Framed<BoxedSocket, Codec>, WsFrame>>;

/// Message: user asked to search for an opponent.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RequestMatch;

/// Message: user accepted the proposed match.
#[derive(Message)]
#[rtype(result = "()")]
pub struct AcceptMatch;

/// Message: user submitted a move. Carries the raw choice string; the
/// machine validates it.
#[derive(Message)]
#[rtype(result = "()")]
pub struct MakeMove(pub String);

/// Message: user asked to quit.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Quit;

pub struct DuelSession {
    machine: DuelClient,
    sink: WsSink,
    /// Handle for the scheduled search timeout, if any.
    search_timer: Option<SpawnHandle>,
    presenter: Box<dyn Presenter>,
    /// Fired once when the session stops, so the binary can exit.
    shutdown: Option<oneshot::Sender<()>>,
}

impl DuelSession {
    /// Wrap a connected socket in a session actor and start it.
    pub fn start_with(
        machine: DuelClient,
        framed: Framed<BoxedSocket, Codec>,
        presenter: Box<dyn Presenter>,
        shutdown: oneshot::Sender<()>,
    ) -> Addr<DuelSession> {
        let (sink, stream) = framed.split();
        DuelSession::create(|ctx| {
            ctx.add_stream(stream);
            DuelSession {
                machine,
                sink: SinkWrite::new(sink, ctx),
                search_timer: None,
                presenter,
                shutdown: Some(shutdown),
            }
        })
    }

    /// Execute the side effects of one transition, in order.
    fn run_effects(&mut self, effects: Vec<Effect>, ctx: &mut Context<Self>) {
        for effect in effects {
            match effect {
                Effect::Send(msg) => self.send_message(&msg),
                Effect::StartSearchTimer { token, duration } => {
                    let handle = ctx.run_later(duration, move |act, ctx| {
                        act.search_timer = None;
                        // The machine decides whether this timer still owns
                        // the search; a stale token yields no effects.
                        let effects = act.machine.handle_search_timeout(token);
                        act.run_effects(effects, ctx);
                    });
                    self.search_timer = Some(handle);
                }
                Effect::CancelSearchTimer => {
                    if let Some(handle) = self.search_timer.take() {
                        ctx.cancel_future(handle);
                    }
                }
                Effect::Render { region, text } => self.presenter.render(region, &text),
                Effect::SetSearchEnabled(enabled) => self.presenter.set_search_enabled(enabled),
            }
        }
    }

    fn send_message(&mut self, msg: &ClientWsMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => {
                if self.sink.write(WsFrame::Text(text.into())).is_err() {
                    warn!("[DuelSession] Transport write failed, frame dropped");
                }
            }
            Err(e) => {
                error!("[DuelSession] Failed to serialize client message: {}", e);
            }
        }
    }

    /// Run a local command against the machine; precondition failures are
    /// rendered, never retried.
    fn run_command(
        &mut self,
        ctx: &mut Context<Self>,
        result: Result<Vec<Effect>, crate::duel::error::CommandError>,
    ) {
        match result {
            Ok(effects) => self.run_effects(effects, ctx),
            Err(e) => self.presenter.render(Region::Status, &e.to_string()),
        }
    }
}

impl Actor for DuelSession {
    type Context = Context<Self>;

    /// The socket is already connected when the actor starts; feed the open
    /// event so the machine (re)announces the identity.
    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[DuelSession] Event channel open");
        let effects = self.machine.handle_connection(ConnectionEvent::Opened);
        self.run_effects(effects, ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl StreamHandler<Result<Frame, WsProtocolError>> for DuelSession {
    /// Handles incoming WebSocket frames from the server.
    fn handle(&mut self, item: Result<Frame, WsProtocolError>, ctx: &mut Self::Context) {
        match item {
            Ok(Frame::Text(bytes)) => match serde_json::from_slice::<ServerWsMessage>(&bytes) {
                Ok(msg) => {
                    debug!("[DuelSession] Server event: {:?}", msg);
                    let effects = self.machine.handle_server(msg);
                    self.run_effects(effects, ctx);
                }
                Err(e) => {
                    warn!("[DuelSession] Unparseable server frame: {}", e);
                }
            },
            Ok(Frame::Ping(payload)) => {
                if self.sink.write(WsFrame::Pong(payload)).is_err() {
                    warn!("[DuelSession] Failed to answer ping");
                }
            }
            Ok(Frame::Close(reason)) => {
                info!("[DuelSession] Server closed the channel: {:?}", reason);
                let effects = self.machine.handle_connection(ConnectionEvent::Closed);
                self.run_effects(effects, ctx);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                warn!("[DuelSession] Protocol error on event channel: {}", e);
                ctx.stop();
            }
        }
    }

    /// The stream ended: the channel is gone. Surface the notice and stop;
    /// reconnection is the transport layer's concern, not this actor's.
    fn finished(&mut self, ctx: &mut Self::Context) {
        let effects = self.machine.handle_connection(ConnectionEvent::Closed);
        self.run_effects(effects, ctx);
        ctx.stop();
    }
}

impl actix::io::WriteHandler<WsProtocolError> for DuelSession {}

impl Handler<RequestMatch> for DuelSession {
    type Result = ();

    fn handle(&mut self, _msg: RequestMatch, ctx: &mut Self::Context) -> Self::Result {
        let result = self.machine.request_match();
        self.run_command(ctx, result);
    }
}

impl Handler<AcceptMatch> for DuelSession {
    type Result = ();

    fn handle(&mut self, _msg: AcceptMatch, ctx: &mut Self::Context) -> Self::Result {
        let result = self.machine.accept_match();
        self.run_command(ctx, result);
    }
}

impl Handler<MakeMove> for DuelSession {
    type Result = ();

    fn handle(&mut self, msg: MakeMove, ctx: &mut Self::Context) -> Self::Result {
        let result = self.machine.make_move(&msg.0);
        self.run_command(ctx, result);
    }
}

impl Handler<Quit> for DuelSession {
    type Result = ();

    fn handle(&mut self, _msg: Quit, ctx: &mut Self::Context) -> Self::Result {
        ctx.stop();
    }
}
