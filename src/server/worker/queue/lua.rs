//! Lua scripts for the Redis message queue

// Lua script to add a message to a queue's sorted set
// The score is the time the message becomes available, so ZRANGEBYSCORE up to "now"
// only ever returns messages that are ready.
//
// KEYS[1]: sorted set key (queue)
// ARGV[1]: serialized message
// ARGV[2]: score (available_at, milliseconds since epoch)
//
// Returns: 1 if the message was added, 0 if the exact same member already existed
pub static PUSH_MESSAGE_SCRIPT: &str = r#"
local queue_key = KEYS[1]
local member = ARGV[1]
local score = tonumber(ARGV[2])

return redis.call('ZADD', queue_key, score, member)
"#;

// Lua script to atomically take the earliest ready message from a queue
// Two consumers popping at the same time can never receive the same member.
//
// KEYS[1]: sorted set key (queue)
// ARGV[1]: current time (milliseconds since epoch)
//
// Returns: the serialized message, or nil if nothing is ready
pub static POP_MESSAGE_SCRIPT: &str = r#"
local queue_key = KEYS[1]
local now = tonumber(ARGV[1])

local ready = redis.call('ZRANGEBYSCORE', queue_key, '-inf', now, 'LIMIT', 0, 1)
if #ready == 0 then
    return nil
end

redis.call('ZREM', queue_key, ready[1])
return ready[1]
"#;
