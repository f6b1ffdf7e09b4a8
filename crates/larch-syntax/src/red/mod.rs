//! The located layer: handles with absolute positions and parent links.

mod list;
mod node;
mod token;
mod trivia;


pub use self::list::{SeparatedSyntaxList, SyntaxList, SyntaxListIter};
pub(crate) use self::node::RedData;
pub use self::node::SyntaxNode;
pub use self::token::SyntaxToken;
pub use self::trivia::SyntaxTrivia;
