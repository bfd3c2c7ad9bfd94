/// Tactical and positional theme tagging.
///
/// Played themes describe the move that was actually made and the position it
/// left. Missed themes are read off the evaluator's best line from the position
/// before the move.

use std::fmt;

use chess::{BitBoard, Board, BoardStatus, ChessMove, Color, Piece, Square, EMPTY};
use chess_core::{PlayerInfo, Score};
use serde::{Serialize, Serializer};

use crate::board_utils::{
    attacks, attacks_with_occupancy, is_capture, is_castling_move, is_en_passant_move, is_hanging,
    is_ray_piece, king_value, parse_uci_move, relative_rank, total_material,
};
use crate::phase::{classify_endgame, EndgameKind, ENDGAME_MATERIAL};

/// How far along the best line missed themes are looked for.
pub const MISSED_LINE_PLIES: usize = 6;

/// Longest mate distance reported on its own; longer mates count as this.
pub const MAX_MATE_IN: u8 = 5;

const ADVANTAGE_CP: i32 = 200;
const CRUSHING_CP: i32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Theme {
    Pin,
    Promotion,
    Underpromotion,
    Checkmate,
    BackRankMate,
    Castling,
    EnPassant,
    DoubleCheck,
    AdvancedPawn,
    AttackingF2F7,
    HangingPiece,
    MateIn(u8),
    PawnEndgame,
    KnightEndgame,
    BishopEndgame,
    RookEndgame,
    QueenEndgame,
    QueenRookEndgame,
    Equality,
    Advantage,
    Crushing,
    Master,
    MasterVsMaster,
    OneMove,
    Short,
    Long,
    VeryLong,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Pin => "pin",
            Theme::Promotion => "promotion",
            Theme::Underpromotion => "underPromotion",
            Theme::Checkmate => "mate",
            Theme::BackRankMate => "backRankMate",
            Theme::Castling => "castling",
            Theme::EnPassant => "enPassant",
            Theme::DoubleCheck => "doubleCheck",
            Theme::AdvancedPawn => "advancedPawn",
            Theme::AttackingF2F7 => "attackingF2F7",
            Theme::HangingPiece => "hangingPiece",
            Theme::MateIn(n) => return write!(f, "mateIn{n}"),
            Theme::PawnEndgame => "pawnEndgame",
            Theme::KnightEndgame => "knightEndgame",
            Theme::BishopEndgame => "bishopEndgame",
            Theme::RookEndgame => "rookEndgame",
            Theme::QueenEndgame => "queenEndgame",
            Theme::QueenRookEndgame => "queenRookEndgame",
            Theme::Equality => "equality",
            Theme::Advantage => "advantage",
            Theme::Crushing => "crushing",
            Theme::Master => "master",
            Theme::MasterVsMaster => "masterVsMaster",
            Theme::OneMove => "oneMove",
            Theme::Short => "short",
            Theme::Long => "long",
            Theme::VeryLong => "veryLong",
        };
        f.write_str(name)
    }
}

// Serialized by name so themes can key JSON maps.
impl Serialize for Theme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<EndgameKind> for Theme {
    fn from(kind: EndgameKind) -> Self {
        match kind {
            EndgameKind::Pawn => Theme::PawnEndgame,
            EndgameKind::Knight => Theme::KnightEndgame,
            EndgameKind::Bishop => Theme::BishopEndgame,
            EndgameKind::Rook => Theme::RookEndgame,
            EndgameKind::Queen => Theme::QueenEndgame,
            EndgameKind::QueenRook => Theme::QueenRookEndgame,
        }
    }
}

/// One move with the boards on either side of it.
pub struct MoveContext {
    pub before: Board,
    pub mv: ChessMove,
    pub after: Board,
}

impl MoveContext {
    pub fn new(before: Board, mv: ChessMove) -> Self {
        let after = before.make_move_new(mv);
        Self { before, mv, after }
    }

    pub fn mover(&self) -> Color {
        self.before.side_to_move()
    }

    fn moved_piece(&self) -> Option<Piece> {
        self.before.piece_on(self.mv.get_source())
    }

    /// A pawn landing on the last rank.
    pub fn is_promotion(&self) -> bool {
        self.moved_piece() == Some(Piece::Pawn)
            && relative_rank(self.mv.get_dest(), self.mover()) == 7
    }

    pub fn is_underpromotion(&self) -> bool {
        self.is_promotion() && self.mv.get_promotion() != Some(Piece::Queen)
    }

    pub fn is_castling(&self) -> bool {
        is_castling_move(&self.before, self.mv)
    }

    pub fn is_en_passant(&self) -> bool {
        is_en_passant_move(&self.before, self.mv)
    }

    pub fn is_double_check(&self) -> bool {
        self.after.checkers().popcnt() >= 2
    }

    /// Pawn pushed to the 6th or 7th rank
    pub fn is_advanced_pawn(&self) -> bool {
        self.moved_piece() == Some(Piece::Pawn)
            && matches!(relative_rank(self.mv.get_dest(), self.mover()), 5 | 6)
    }

    /// Capture on the f2/f7 square
    pub fn is_attacking_f2_f7(&self) -> bool {
        let dest = self.mv.get_dest();
        (dest == Square::F2 || dest == Square::F7) && is_capture(&self.before, self.mv)
    }

    pub fn gives_checkmate(&self) -> bool {
        self.after.status() == BoardStatus::Checkmate
    }

    /// The moved piece now pins an enemy piece to its king or to something
    /// worth more behind it.
    pub fn is_pin(&self) -> bool {
        let dest = self.mv.get_dest();
        if !self.after.piece_on(dest).is_some_and(is_ray_piece) {
            return false;
        }
        let enemy = *self.after.color_combined(!self.mover());
        let occupied = *self.after.combined();
        let direct = attacks(&self.after, dest);

        for target in direct & enemy {
            let target_piece = match self.after.piece_on(target) {
                Some(Piece::King) | None => continue,
                Some(p) => p,
            };
            let through = attacks_with_occupancy(
                &self.after,
                dest,
                occupied & !BitBoard::from_square(target),
            );
            let behind = through & !direct & chess::line(dest, target) & enemy;
            for sq in behind {
                if let Some(back) = self.after.piece_on(sq) {
                    if king_value(back) > king_value(target_piece) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Mate delivered along the mated king's back rank, with the king boxed
    /// in by its own pieces.
    pub fn is_back_rank_mate(&self) -> bool {
        if !self.gives_checkmate() {
            return false;
        }
        let mated = !self.mover();
        let king = self.after.king_square(mated);
        if relative_rank(king, mated) != 0 {
            return false;
        }
        let checkers = *self.after.checkers();
        if checkers.into_iter().any(|sq| sq.get_rank() != king.get_rank()) {
            return false;
        }

        let own = *self.after.color_combined(mated);
        let escape = chess::get_king_moves(king) & !chess::get_rank(king.get_rank());
        escape != EMPTY && (escape & own) == escape
    }

    /// Capture of an undefended non-pawn piece.
    pub fn captures_hanging_piece(&self) -> bool {
        let dest = self.mv.get_dest();
        match self.before.piece_on(dest) {
            Some(Piece::Pawn) | Some(Piece::King) | None => false,
            Some(_) => is_hanging(&self.before, !self.mover(), dest),
        }
    }

    pub fn endgame_kind(&self) -> Option<EndgameKind> {
        if total_material(&self.after) <= ENDGAME_MATERIAL {
            classify_endgame(&self.after)
        } else {
            None
        }
    }
}

fn push_unique(themes: &mut Vec<Theme>, theme: Theme) {
    if !themes.contains(&theme) {
        themes.push(theme);
    }
}

/// Move-level detectors shared by played and missed moves.
fn move_themes(ctx: &MoveContext, themes: &mut Vec<Theme>) {
    if ctx.is_promotion() {
        push_unique(themes, Theme::Promotion);
        if ctx.is_underpromotion() {
            push_unique(themes, Theme::Underpromotion);
        }
    }
    if ctx.is_castling() {
        push_unique(themes, Theme::Castling);
    }
    if ctx.is_en_passant() {
        push_unique(themes, Theme::EnPassant);
    }
    if ctx.is_double_check() {
        push_unique(themes, Theme::DoubleCheck);
    }
    if ctx.is_advanced_pawn() {
        push_unique(themes, Theme::AdvancedPawn);
    }
    if ctx.is_attacking_f2_f7() {
        push_unique(themes, Theme::AttackingF2F7);
    }
    if ctx.is_pin() {
        push_unique(themes, Theme::Pin);
    }
}

/// Themes of the move actually played. `game_ended_in_mate` is true only for
/// the last move of a game whose result is checkmate.
pub fn played_themes(ctx: &MoveContext, game_ended_in_mate: bool) -> Vec<Theme> {
    let mut themes = Vec::new();
    move_themes(ctx, &mut themes);

    if game_ended_in_mate {
        push_unique(&mut themes, Theme::Checkmate);
        if ctx.is_back_rank_mate() {
            push_unique(&mut themes, Theme::BackRankMate);
        }
    }
    if let Some(kind) = ctx.endgame_kind() {
        push_unique(&mut themes, kind.into());
    }
    themes
}

/// Bucket a mover-perspective score by how lopsided the position is.
pub fn advantage_theme(score: Score) -> Theme {
    let cp = score.to_cp().abs();
    if cp < ADVANTAGE_CP {
        Theme::Equality
    } else if cp < CRUSHING_CP {
        Theme::Advantage
    } else {
        Theme::Crushing
    }
}

/// Bucket the best line by its length in plies.
pub fn line_length_theme(plies: usize) -> Option<Theme> {
    match plies {
        0 => None,
        1..=2 => Some(Theme::OneMove),
        3..=4 => Some(Theme::Short),
        5..=6 => Some(Theme::Long),
        _ => Some(Theme::VeryLong),
    }
}

fn is_master_title(player: &PlayerInfo) -> bool {
    player
        .title
        .as_deref()
        .is_some_and(|t| !t.is_empty() && t != "BOT")
}

/// Game-level tag from the players' titles. Bot accounts do not count.
pub fn master_theme(white: &PlayerInfo, black: &PlayerInfo) -> Option<Theme> {
    match (is_master_title(white), is_master_title(black)) {
        (true, true) => Some(Theme::MasterVsMaster),
        (true, false) | (false, true) => Some(Theme::Master),
        (false, false) => None,
    }
}

/// Themes along the best line from `before`, which the mover did not play.
///
/// `line` is in UCI; the walk stops at the first move that is not legal.
pub fn missed_themes(before: &Board, line: &[String], score_before: Option<Score>) -> Vec<Theme> {
    let mut themes = Vec::new();
    let mover = before.side_to_move();

    if let Some(n) = score_before.and_then(Score::mating_in) {
        push_unique(&mut themes, Theme::MateIn(n.min(MAX_MATE_IN as u32) as u8));
    }

    let mut board = *before;
    let mut readable = 0;
    for uci in line.iter().take(MISSED_LINE_PLIES) {
        let mv = match parse_uci_move(&board, uci) {
            Some(mv) => mv,
            None => break,
        };
        readable += 1;
        let ctx = MoveContext::new(board, mv);
        if ctx.mover() == mover {
            move_themes(&ctx, &mut themes);
            if ctx.captures_hanging_piece() {
                push_unique(&mut themes, Theme::HangingPiece);
            }
            if ctx.is_back_rank_mate() {
                push_unique(&mut themes, Theme::BackRankMate);
            }
        }
        board = ctx.after;
    }

    // A line whose first move does not fit the position says nothing
    if readable > 0 {
        if let Some(theme) = line_length_theme(line.len()) {
            push_unique(&mut themes, theme);
        }
    }

    if let Some(score) = score_before {
        push_unique(&mut themes, advantage_theme(score));
    }
    themes
}
